//! Session commands: login, logout, whoami.

use clementine_client::CommerceClient;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Sign in and persist the session.
pub async fn login(client: &CommerceClient, email: &str, password: &str) -> CommandResult {
    let session = client.auth().login(email, password).await?;

    match session.user {
        Some(user) => println!("Signed in as {}", user.display_name()),
        None => println!("Signed in"),
    }
    Ok(())
}

/// Revoke the refresh token and clear stored credentials.
pub async fn logout(client: &CommerceClient) -> CommandResult {
    client.auth().logout().await?;
    println!("Signed out");
    Ok(())
}

/// Print the current user.
pub async fn whoami(client: &CommerceClient) -> CommandResult {
    if !client.is_authenticated().await {
        println!("Not signed in");
        return Ok(());
    }

    let user = client.auth().me().await?;
    println!("{} <{}>", user.display_name(), user.email);
    Ok(())
}
