pub fn main() {
    env_logger::init();

    let customer_key = std::env::var("FEATURESWITCHES_CUSTOMER_KEY").unwrap();
    let environment_key = std::env::var("FEATURESWITCHES_ENVIRONMENT_KEY").unwrap();
    let client = featureswitches::ClientConfig::from_keys(customer_key, environment_key)
        .to_client()
        .unwrap();

    if !client.authenticate() {
        eprintln!("Invalid customer or environment key");
        return;
    }

    // Warm the cache so the checks below don't need a round-trip each.
    if let Err(err) = client.sync() {
        eprintln!("Failed to sync features: {}", err);
    }

    let enabled = client.is_enabled("a-feature", Some("test-user"), false);

    println!("Enabled: {:?}", enabled);
}
