//! Example client for the fragments API
//!
//! Runs a create / read / update / list / delete round trip against the
//! service named by `API_URL`, authenticating with `FRAGMENTS_TOKEN`.

use fragments_client::{BearerToken, ClientConfig, FragmentList, FragmentsClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Defaults to localhost:8080 unless API_URL is set
    let client = FragmentsClient::with_config(ClientConfig::from_env())?;
    let token = std::env::var("FRAGMENTS_TOKEN")?;
    let auth = BearerToken::new(&token)?;
    println!("Fragments API Client Example ({})", client.base_url());
    println!("-------------------------------");

    println!("\nCreating a fragment...");
    let created = client
        .create_typed_fragment(&auth, "# Hello\n\nFrom the client example.", "text/markdown")
        .await?;
    let id = created
        .fragment()
        .map(|f| f.id)
        .ok_or("create response did not include a fragment")?;
    println!("Created {} at {:?}", id, created.location);

    println!("\nFetching it back...");
    let body = client.get_fragment(&auth, &id).await?;
    println!("{:?}", body);

    println!("\nUpdating it...");
    client
        .update_fragment(&auth, &id, "# Hello again\n")
        .await?;

    println!("\nListing fragments...");
    let data = client.list_fragments_expanded(&auth, true).await?;
    let list = FragmentList::from_body(&data)?;
    println!("You own {} fragment(s): {:?}", list.len(), list.ids());

    println!("\nDeleting it...");
    client.delete_fragment(&auth, &id).await?;

    println!("\nAll operations completed successfully!");
    Ok(())
}
