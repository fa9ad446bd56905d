#[actix_web::main]
async fn main() -> std::io::Result<()> {
    client_agreement::run().await
}
