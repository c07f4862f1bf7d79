#[actix_web::main]
async fn main() -> std::io::Result<()> {
    sheetmerge_lib::run().await
}
