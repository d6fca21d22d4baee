//! Work order data model.
//!
//! [`CollectedOrder`] is the JSON the model emits after the generation marker.
//! Every field is optional and loosely typed on input: missing keys and
//! `null` become empty, numbers given where text is expected are kept as
//! text, and service values may arrive as numbers or as currency strings.
//! [`WorkOrder`] adds the number and date stamped by the service.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Value the model writes into `logo_data_base64` once the user uploaded a logo.
pub const LOGO_PLACEHOLDER: &str = "[LOGO_PLACEHOLDER]";

/// Plate segment used in file names when no plate was collected.
const NO_PLATE: &str = "SEM_PLACA";

/// The repair shop issuing the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workshop {
    /// Trading name.
    #[serde(deserialize_with = "text")]
    pub nome: String,
    /// Company registration number.
    #[serde(deserialize_with = "text")]
    pub cnpj: String,
    /// Street address.
    #[serde(deserialize_with = "text")]
    pub endereco: String,
    /// City and state line; the address is shown when empty.
    #[serde(deserialize_with = "text")]
    pub cidade_estado: String,
    /// Contact phone.
    #[serde(deserialize_with = "text")]
    pub telefone: String,
    /// A `data:image/...;base64,` URI, [`LOGO_PLACEHOLDER`], or empty.
    #[serde(deserialize_with = "text")]
    pub logo_data_base64: String,
}

/// The vehicle owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    /// Full name.
    #[serde(deserialize_with = "text")]
    pub nome: String,
    /// Contact phone.
    #[serde(deserialize_with = "text")]
    pub telefone: String,
    /// CPF or CNPJ.
    #[serde(deserialize_with = "text")]
    pub documento: String,
    /// Street address.
    #[serde(deserialize_with = "text")]
    pub endereco: String,
}

/// The vehicle being serviced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    /// Make.
    #[serde(deserialize_with = "text")]
    pub marca: String,
    /// Model.
    #[serde(deserialize_with = "text")]
    pub modelo: String,
    /// Model year, kept as text.
    #[serde(deserialize_with = "text")]
    pub ano: String,
    /// License plate.
    #[serde(deserialize_with = "text")]
    pub placa: String,
}

/// One line of the service / parts table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceItem {
    /// Service performed or part sold.
    #[serde(deserialize_with = "text")]
    pub descricao: String,
    /// Who did the work.
    #[serde(deserialize_with = "text")]
    pub responsavel: String,
    /// Price in reais.
    #[serde(deserialize_with = "amount")]
    pub valor: f64,
}

/// Everything the dialogue collects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectedOrder {
    /// Issuing workshop.
    #[serde(deserialize_with = "or_default")]
    pub oficina: Workshop,
    /// Customer.
    #[serde(deserialize_with = "or_default")]
    pub cliente: Customer,
    /// Vehicle.
    #[serde(deserialize_with = "or_default")]
    pub veiculo: Vehicle,
    /// Services and parts, in the order they were given.
    #[serde(deserialize_with = "or_default")]
    pub servicos: Vec<ServiceItem>,
    /// Free-form notes.
    #[serde(deserialize_with = "text")]
    pub observacoes: String,
}

impl CollectedOrder {
    /// Swap the logo placeholder for the data the browser uploaded.
    ///
    /// When the placeholder is present but nothing was uploaded, the logo is
    /// cleared instead. Any other logo value is left alone.
    pub fn resolve_logo(&mut self, uploaded: Option<&str>) {
        if self.oficina.logo_data_base64 != LOGO_PLACEHOLDER {
            return;
        }

        match uploaded.filter(|data| !data.is_empty()) {
            Some(data) => {
                info!("Replacing logo placeholder with uploaded image data");
                self.oficina.logo_data_base64 = data.to_string();
            }
            None => {
                warn!("Model returned the logo placeholder but no logo was uploaded");
                self.oficina.logo_data_base64.clear();
            }
        }
    }
}

/// A collected order stamped with its number and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Short order number, `OS` + `yymmdd-HHMM`.
    pub numero_os: String,
    /// Issue date, `dd/mm/yyyy`.
    pub data_os: String,
    /// Issuing workshop.
    pub oficina: Workshop,
    /// Customer.
    pub cliente: Customer,
    /// Vehicle.
    pub veiculo: Vehicle,
    /// Services and parts.
    pub servicos: Vec<ServiceItem>,
    /// Free-form notes.
    pub observacoes: String,
}

impl WorkOrder {
    /// Stamp a collected order with a number and date derived from `at`.
    #[must_use]
    pub fn finalize(collected: CollectedOrder, at: NaiveDateTime) -> Self {
        Self {
            numero_os: at.format("OS%y%m%d-%H%M").to_string(),
            data_os: at.format("%d/%m/%Y").to_string(),
            oficina: collected.oficina,
            cliente: collected.cliente,
            veiculo: collected.veiculo,
            servicos: collected.servicos,
            observacoes: collected.observacoes,
        }
    }

    /// Sum of all service values.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.servicos.iter().fold(0.0, |acc, s| acc + s.valor)
    }

    /// File name for the rendered document: `{numero_os}_{plate}_{short_id}.pdf`.
    #[must_use]
    pub fn file_name(&self, short_id: &str) -> String {
        format!("{}_{}_{}.pdf", self.numero_os, self.plate_segment(), short_id)
    }

    /// The plate restricted to ASCII alphanumerics, or [`NO_PLATE`].
    fn plate_segment(&self) -> String {
        let plate: String = self
            .veiculo
            .placa
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();

        if plate.is_empty() {
            NO_PLATE.to_string()
        } else {
            plate.to_ascii_uppercase()
        }
    }
}

/// Parse a currency amount the way people type it in Brazil.
///
/// Accepts `500`, `500.5`, `500,50`, `1.250,50` and an optional `R$` prefix.
/// Anything else, including US grouping like `1,250.50`, is 0.0.
#[must_use]
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let normalized = if let Some(comma) = cleaned.rfind(',') {
        if cleaned.rfind('.').is_some_and(|dot| dot > comma) {
            return 0.0;
        }
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_amount(&s),
        _ => 0.0,
    })
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
