pub mod challenges;
pub mod pdfs;
pub mod records;
pub mod users;

pub async fn health() -> &'static str {
    "OK"
}
