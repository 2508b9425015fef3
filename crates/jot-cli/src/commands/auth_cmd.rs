use crate::error::CliError;
use crate::session::Session;

pub async fn run_login(session: &Session, email: &str, password: &str) -> Result<(), CliError> {
    session.auth().login(email, password).await?;
    println!(
        "Signed in as {} (backend {})",
        email.trim(),
        session.auth().base_url().get()
    );
    Ok(())
}

pub async fn run_logout(session: &Session) -> Result<(), CliError> {
    session.auth().logout()?;
    session.repository().clear_local_data().await?;
    println!("Signed out and cleared local notes");
    Ok(())
}
