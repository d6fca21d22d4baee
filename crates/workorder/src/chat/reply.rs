//! Inspection of model replies for the generation marker.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::order::CollectedOrder;

/// Sentinel the model emits, followed by the collected JSON, once the user
/// confirms the summary.
pub const MARKER: &str = "[GERAR_PDF]";

/// A Markdown code fence wrapped around the payload, with optional language tag.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*(.*?)\s*```").expect("Invalid code fence pattern")
});

/// What the service should do with a model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Ordinary dialogue; forward the text to the user.
    Chat(String),
    /// The dialogue is over; render the collected order.
    Generate(CollectedOrder),
}

/// Classify a model reply.
///
/// Text without [`MARKER`] is returned unchanged as [`Reply::Chat`]. Otherwise
/// the first JSON value after the first marker is parsed into a
/// [`CollectedOrder`]; a surrounding code fence and any trailing prose are
/// ignored.
///
/// # Errors
///
/// Returns [`Error::MissingPayload`] when nothing follows the marker, and
/// [`Error::InvalidOrder`] when the payload is not a JSON object of the
/// expected shape.
pub fn inspect_reply(text: &str) -> Result<Reply> {
    let Some((_, after)) = text.split_once(MARKER) else {
        return Ok(Reply::Chat(text.to_string()));
    };

    let payload = strip_code_fence(after.trim());
    if payload.is_empty() {
        return Err(Error::MissingPayload);
    }

    let value = first_json_value(payload)?;
    if !value.is_object() {
        return Err(Error::invalid_order("payload is not a JSON object"));
    }

    let order: CollectedOrder =
        serde_json::from_value(value).map_err(|e| Error::invalid_order(e.to_string()))?;
    Ok(Reply::Generate(order))
}

fn strip_code_fence(payload: &str) -> &str {
    CODE_FENCE
        .captures(payload)
        .and_then(|caps| caps.get(1))
        .map_or(payload, |m| m.as_str().trim())
}

fn first_json_value(payload: &str) -> Result<Value> {
    let mut values = serde_json::Deserializer::from_str(payload).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(Error::invalid_order(e.to_string())),
        None => Err(Error::MissingPayload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "oficina": {"nome": "Auto Center Silva", "logo_data_base64": ""},
        "cliente": {"nome": "Maria"},
        "veiculo": {"placa": "ABC-1234"},
        "servicos": [{"descricao": "Pintura capô", "responsavel": "Leo", "valor": 500}],
        "observacoes": ""
    }"#;

    #[test]
    fn test_plain_reply_is_chat() {
        let reply = inspect_reply("Qual o nome do cliente? 📝").unwrap();
        assert_eq!(reply, Reply::Chat("Qual o nome do cliente? 📝".to_string()));
    }

    #[test]
    fn test_marker_reply_is_parsed() {
        let text = format!("{MARKER}\n{PAYLOAD}");
        let Reply::Generate(order) = inspect_reply(&text).unwrap() else {
            panic!("expected a generate reply");
        };
        assert_eq!(order.oficina.nome, "Auto Center Silva");
        assert_eq!(order.servicos.len(), 1);
    }

    #[test]
    fn test_text_before_marker_is_ignored() {
        let text = format!("Perfeito! Gerando sua OS. {MARKER} {PAYLOAD}");
        assert!(matches!(inspect_reply(&text).unwrap(), Reply::Generate(_)));
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let text = format!("{MARKER}\n```json\n{PAYLOAD}\n```");
        assert!(matches!(inspect_reply(&text).unwrap(), Reply::Generate(_)));
    }

    #[test]
    fn test_trailing_prose_is_ignored() {
        let text = format!("{MARKER}{PAYLOAD}\nObrigado por usar o sistema!");
        assert!(matches!(inspect_reply(&text).unwrap(), Reply::Generate(_)));
    }

    #[test]
    fn test_payload_after_first_marker_wins() {
        let text = format!("{MARKER} {{\"observacoes\": \"primeiro\"}} {MARKER} {{\"observacoes\": \"segundo\"}}");
        let Reply::Generate(order) = inspect_reply(&text).unwrap() else {
            panic!("expected a generate reply");
        };
        assert_eq!(order.observacoes, "primeiro");
    }

    #[test]
    fn test_marker_without_payload() {
        let err = inspect_reply(MARKER).unwrap_err();
        assert!(matches!(err, Error::MissingPayload));

        let err = inspect_reply(&format!("{MARKER}   \n ")).unwrap_err();
        assert!(matches!(err, Error::MissingPayload));
    }

    #[test]
    fn test_malformed_payload() {
        let err = inspect_reply(&format!("{MARKER} {{\"oficina\": ")).unwrap_err();
        assert!(matches!(err, Error::InvalidOrder(_)));
    }

    #[test]
    fn test_non_object_payload() {
        let err = inspect_reply(&format!("{MARKER} [1, 2, 3]")).unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
    }
}
