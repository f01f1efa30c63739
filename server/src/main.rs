#[tokio::main]
async fn main() {
    civicdesk::start_server().await;
}
