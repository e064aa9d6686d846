use std::sync::Arc;

use health_client::{ChallengeId, Client, Error, RecordInput, RegisterRequest};
use healthhub_server::{AppState, auth::JwtKeys, router};

struct Running {
    base_url: String,
    _dir: tempfile::TempDir,
}

async fn start() -> Running {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(JwtKeys::new("e2e-secret"), dir.path().join("pdfs"));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(Arc::new(state)).into_make_service())
            .await
            .unwrap();
    });

    Running {
        base_url: format!("http://{}", addr),
        _dir: dir,
    }
}

fn signup(email: &str, name: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "secret".to_string(),
        name: name.to_string(),
    }
}

fn server_status(result: Result<impl std::fmt::Debug, Error>) -> (u16, String) {
    match result {
        Err(Error::ServerError { status, message }) => (status, message),
        other => panic!("expected a server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_account_flow() {
    let server = start().await;
    let mut client = Client::new(&server.base_url);

    assert_eq!(client.health().await.unwrap(), "OK");

    let created = client.register(&signup("a@b.c", "Alice")).await.unwrap();
    assert_eq!(created.message, "User created successfully");

    let duplicate = client.register(&signup("a@b.c", "Alice")).await;
    assert_eq!(
        server_status(duplicate),
        (400, "Email already registered".to_string())
    );

    let (status, message) = server_status(client.login("a@b.c", "wrong").await);
    assert_eq!(status, 401);
    assert_eq!(message, "Invalid credentials");
    assert!(client.token().is_none());

    let login = client.login("a@b.c", "secret").await.unwrap();
    assert_eq!(login.user.name, "Alice");
    assert_eq!(client.token(), Some(login.token.as_str()));

    client.logout();
    assert!(matches!(client.list_records().await, Err(Error::NotAuthenticated)));

    let forged = Client::new(&server.base_url).with_token("forged.token.value");
    let (status, message) = server_status(forged.list_records().await);
    assert_eq!((status, message.as_str()), (403, "Invalid token"));
}

#[tokio::test]
async fn test_records_flow() {
    let server = start().await;
    let mut alice = Client::new(&server.base_url);
    let mut bob = Client::new(&server.base_url);

    alice.register(&signup("a@b.c", "Alice")).await.unwrap();
    bob.register(&signup("b@b.c", "Bob")).await.unwrap();
    alice.login("a@b.c", "secret").await.unwrap();
    bob.login("b@b.c", "secret").await.unwrap();

    let record = alice
        .create_record(&RecordInput::new("checkup", "Annual physical", "Dr. Smith"))
        .await
        .unwrap();
    assert_eq!(record.kind, "checkup");
    assert_eq!(alice.list_records().await.unwrap(), vec![record.clone()]);
    assert!(bob.list_records().await.unwrap().is_empty());

    let (status, message) = server_status(bob.get_record(record.id).await);
    assert_eq!((status, message.as_str()), (404, "Record not found"));

    let updated = alice
        .update_record(
            record.id,
            &RecordInput::new("follow-up", "Blood pressure check", "Dr. Smith"),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, record.id);
    assert_eq!(updated.date, record.date);
    assert_eq!(alice.get_record(record.id).await.unwrap(), updated);

    let deleted = alice.delete_record(record.id).await.unwrap();
    assert_eq!(deleted.message, "Record deleted successfully");
    assert_eq!(server_status(alice.delete_record(record.id).await).0, 404);
}

#[tokio::test]
async fn test_challenges_flow() {
    let server = start().await;
    let mut alice = Client::new(&server.base_url);
    let mut bob = Client::new(&server.base_url);

    alice.register(&signup("a@b.c", "Alice")).await.unwrap();
    bob.register(&signup("b@b.c", "Bob")).await.unwrap();
    alice.login("a@b.c", "secret").await.unwrap();
    bob.login("b@b.c", "secret").await.unwrap();

    bob.complete_challenge(1).await.unwrap();
    alice.complete_challenge(1).await.unwrap();
    let text = alice.complete_challenge("walk-10k").await.unwrap();
    assert_eq!(text.challenge_id, ChallengeId::from("walk-10k"));

    assert_eq!(alice.list_challenges().await.unwrap().len(), 2);
    assert_eq!(bob.list_challenges().await.unwrap().len(), 1);

    let board = Client::new(&server.base_url).leaderboard().await.unwrap();
    let board: Vec<(String, u64)> = board.into_iter().map(|e| (e.username, e.count)).collect();
    assert_eq!(
        board,
        vec![("Alice".to_string(), 2), ("Bob".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_pdf_flow() {
    let server = start().await;
    let mut alice = Client::new(&server.base_url);
    let mut bob = Client::new(&server.base_url);

    alice.register(&signup("a@b.c", "Alice")).await.unwrap();
    bob.register(&signup("b@b.c", "Bob")).await.unwrap();
    alice.login("a@b.c", "secret").await.unwrap();
    bob.login("b@b.c", "secret").await.unwrap();

    assert!(alice.list_pdfs().await.unwrap().is_empty());

    let content = b"%PDF-1.4 lab results".to_vec();
    let uploaded = alice.upload_pdf("labs.pdf", content.clone()).await.unwrap();
    assert_eq!(uploaded.message, "PDF uploaded successfully");
    assert!(uploaded.filename.starts_with("user_1_"));
    assert!(uploaded.filename.ends_with(".pdf"));

    assert_eq!(alice.list_pdfs().await.unwrap(), vec![uploaded.filename.clone()]);
    assert!(bob.list_pdfs().await.unwrap().is_empty());

    let downloaded = alice.download_pdf(&uploaded.filename).await.unwrap();
    assert_eq!(downloaded.as_ref(), content.as_slice());

    let (status, message) = server_status(bob.download_pdf(&uploaded.filename).await);
    assert_eq!((status, message.as_str()), (403, "Forbidden"));

    let (status, message) = server_status(alice.download_pdf("user_1_0.pdf").await);
    assert_eq!((status, message.as_str()), (404, "File not found"));

    // Reaches the download route as one name instead of being cut at `?`.
    let (status, message) = server_status(alice.download_pdf("?user_1_0.pdf").await);
    assert_eq!((status, message.as_str()), (403, "Forbidden"));
}
