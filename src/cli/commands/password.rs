use crate::auth::password::hash_password;

pub async fn handle(password: String) -> anyhow::Result<()> {
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    println!("{}", hash_password(password).await?);
    Ok(())
}
