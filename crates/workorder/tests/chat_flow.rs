use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};

use tempfile::TempDir;
use tokio::sync::Mutex;

use workorder::chat::{ChatMessage, ChatModel, Role, LOGO_ATTACHED, MARKER, SYSTEM_PROMPT};
use workorder::document::Renderer;
use workorder::server::{build_router, AppState, PDF_READY};
use workorder::{Error, Result, Storage};

const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

enum Script {
    Reply(String),
    ContextTooLong,
    Fail,
}

struct ScriptedModel {
    script: Script,
    seen: StdMutex<Vec<ChatMessage>>,
}

impl ScriptedModel {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            seen: StdMutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        *self.seen.lock().unwrap() = messages.to_vec();
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::ContextTooLong => Err(Error::ModelApi {
                status: 400,
                body: r#"{"error":{"code":"context_length_exceeded","message":"too long"}}"#
                    .to_string(),
            }),
            Script::Fail => Err(Error::EmptyReply),
        }
    }
}

struct TestServer {
    addr: SocketAddr,
    dir: TempDir,
    storage: Arc<Mutex<Storage>>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn start(model: Arc<ScriptedModel>) -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let output_dir = dir.path().to_path_buf();
    let storage = Storage::open_in_memory().expect("storage");
    start_with(model, dir, output_dir, storage).await
}

async fn start_with(
    model: Arc<ScriptedModel>,
    dir: TempDir,
    output_dir: PathBuf,
    storage: Storage,
) -> TestServer {
    let storage = Arc::new(Mutex::new(storage));
    let state = AppState::new(Arc::clone(&storage), model, Renderer::default(), output_dir);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    TestServer { addr, dir, storage }
}

fn order_reply() -> String {
    format!(
        r#"Perfeito! {MARKER}
```json
{{
  "oficina": {{"nome": "Auto Center Silva", "cnpj": "12.345.678/0001-90", "cidade_estado": "Niterói - RJ", "telefone": "(21) 99999-0000", "logo_data_base64": "[LOGO_PLACEHOLDER]"}},
  "cliente": {{"nome": "Maria Souza", "telefone": "(21) 98888-1111", "documento": "123.456.789-00", "endereco": "Rua X, 10"}},
  "veiculo": {{"marca": "Fiat", "modelo": "Uno", "ano": "2015", "placa": "abc-1d23"}},
  "servicos": [
    {{"descricao": "Pintura capô", "responsavel": "Leo", "valor": 500}},
    {{"descricao": "Polimento", "responsavel": "Leo", "valor": "80,50"}}
  ],
  "observacoes": "Entregar sexta."
}}
```"#
    )
}

async fn post_chat(server: &TestServer, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(server.url("/chat"))
        .json(&body)
        .send()
        .await
        .expect("send chat")
}

#[tokio::test]
async fn healthz_and_index() {
    let server = start(ScriptedModel::new(Script::Fail)).await;

    let res = reqwest::get(server.url("/healthz")).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok"}));

    let res = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(res.headers().contains_key("x-request-id"));
    let html = res.text().await.unwrap();
    assert!(html.contains(LOGO_ATTACHED));
}

#[tokio::test]
async fn chat_reply_is_forwarded() {
    let model = ScriptedModel::new(Script::Reply("Qual o nome da oficina?".to_string()));
    let server = start(Arc::clone(&model)).await;

    let res = post_chat(
        &server,
        serde_json::json!({
            "history": [{"role": "assistant", "content": "Olá!"}],
            "message": "Oi"
        }),
    )
    .await;

    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["type"], "chat");
    assert_eq!(body["message"], "Qual o nome da oficina?");

    let seen = model.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].role, Role::System);
    assert_eq!(seen[0].content, SYSTEM_PROMPT);
    assert_eq!(seen[1], ChatMessage::assistant("Olá!"));
    assert_eq!(seen[2], ChatMessage::user("Oi"));
}

#[tokio::test]
async fn logo_notice_is_forwarded_as_user_message() {
    let model = ScriptedModel::new(Script::Reply("Logo recebido!".to_string()));
    let server = start(Arc::clone(&model)).await;

    let res = post_chat(
        &server,
        serde_json::json!({"history": [], "message": LOGO_ATTACHED, "logo_data": TINY_PNG}),
    )
    .await;

    assert_eq!(res.status(), 200);
    let seen = model.seen.lock().unwrap().clone();
    assert_eq!(seen.last(), Some(&ChatMessage::user(LOGO_ATTACHED)));
}

#[tokio::test]
async fn marker_reply_generates_downloadable_pdf() {
    let server = start(ScriptedModel::new(Script::Reply(order_reply()))).await;

    let res = post_chat(
        &server,
        serde_json::json!({"history": [], "message": "Sim, confirmo", "logo_data": TINY_PNG}),
    )
    .await;

    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["type"], "pdf");
    assert_eq!(body["message"], PDF_READY);

    let url = body["url"].as_str().unwrap().to_string();
    let filename = url.strip_prefix("/download/").unwrap().to_string();
    assert!(filename.starts_with("OS"));
    assert!(filename.contains("_ABC1D23_"));
    assert!(filename.ends_with(".pdf"));
    assert!(server.dir.path().join(&filename).is_file());

    {
        let storage = server.storage.lock().await;
        assert_eq!(storage.count().unwrap(), 1);
        assert!(storage.find(&filename).unwrap().is_some());
    }

    let res = reqwest::get(server.url(&url)).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/pdf");
    assert!(res.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .starts_with("attachment"));
    let bytes = res.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn registry_failure_leaves_no_unregistered_file() {
    let db_dir = tempfile::tempdir().expect("db tempdir");
    let db_path = db_dir.path().join("os_files.db");
    let storage = Storage::open(&db_path).expect("storage");
    rusqlite::Connection::open(&db_path)
        .expect("second connection")
        .execute_batch("DROP TABLE generated_files")
        .expect("drop registry table");

    let dir = tempfile::tempdir().expect("tempdir");
    let output_dir = dir.path().to_path_buf();
    let server = start_with(
        ScriptedModel::new(Script::Reply(order_reply())),
        dir,
        output_dir,
        storage,
    )
    .await;

    let res = post_chat(&server, serde_json::json!({"history": [], "message": "Sim"})).await;

    assert_eq!(res.status(), 500);
    let leftovers = std::fs::read_dir(server.dir.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn failed_write_is_unregistered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output_dir = dir.path().join("not-created");
    let server = start_with(
        ScriptedModel::new(Script::Reply(order_reply())),
        dir,
        output_dir,
        Storage::open_in_memory().expect("storage"),
    )
    .await;

    let res = post_chat(&server, serde_json::json!({"history": [], "message": "Sim"})).await;

    assert_eq!(res.status(), 500);
    assert_eq!(server.storage.lock().await.count().unwrap(), 0);
}

#[tokio::test]
async fn placeholder_without_upload_still_generates() {
    let server = start(ScriptedModel::new(Script::Reply(order_reply()))).await;

    let res = post_chat(&server, serde_json::json!({"history": [], "message": "Sim"})).await;

    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["type"], "pdf");
}

#[tokio::test]
async fn context_length_exceeded_is_a_bad_request() {
    let server = start(ScriptedModel::new(Script::ContextTooLong)).await;

    let res = post_chat(&server, serde_json::json!({"history": [], "message": "Oi"})).await;

    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["type"], "error");
    assert_eq!(body["message"], "Erro: O histórico da conversa é muito longo.");
}

#[tokio::test]
async fn model_failure_is_a_server_error() {
    let server = start(ScriptedModel::new(Script::Fail)).await;

    let res = post_chat(&server, serde_json::json!({"history": [], "message": "Oi"})).await;

    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["type"], "error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Ocorreu um erro no servidor: "));
}

#[tokio::test]
async fn malformed_payload_is_a_server_error() {
    let reply = format!("{MARKER} {{\"oficina\": ");
    let server = start(ScriptedModel::new(Script::Reply(reply))).await;

    let res = post_chat(&server, serde_json::json!({"history": [], "message": "Sim"})).await;

    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["type"], "error");
    assert_eq!(server.storage.lock().await.count().unwrap(), 0);
}

#[tokio::test]
async fn download_rejects_traversal_and_unknown_files() {
    let server = start(ScriptedModel::new(Script::Fail)).await;
    std::fs::write(server.dir.path().join("secret.txt"), b"x").unwrap();

    let res = reqwest::get(server.url("/download/..%2Fsecret.txt")).await.unwrap();
    assert_eq!(res.status(), 400);

    let res = reqwest::get(server.url("/download/a%22b.pdf")).await.unwrap();
    assert_eq!(res.status(), 400);

    let res = reqwest::get(server.url("/download/missing.pdf")).await.unwrap();
    assert_eq!(res.status(), 404);

    let res = reqwest::get(server.url("/download/secret.txt")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/octet-stream");
}
