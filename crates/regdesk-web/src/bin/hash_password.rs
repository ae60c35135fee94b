use std::io::{self, Write};

fn main() -> anyhow::Result<()> {
    eprint!("Enter admin password: ");
    io::stderr().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim();

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let hash = regdesk_core::password::hash_password(password)?;
    println!("{hash}");
    Ok(())
}
