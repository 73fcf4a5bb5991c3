use mongodb::{options::ClientOptions, Client, Database};

use crate::config::Config;

pub async fn connect(config: &Config) -> Database {
    let client_options = ClientOptions::parse(&config.database_url)
        .await
        .expect("Failed to parse MongoDB connection string");

    let client =
        Client::with_options(client_options).expect("Failed to initialize MongoDB client");

    client.database(&config.database_name)
}
