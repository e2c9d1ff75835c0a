//! Session CLI commands: login, logout, whoami.
//!
//! The session lives in `{data_dir}/session.json` under the same keys the
//! web client used in local storage. There is no server-side check: this
//! is a demo login and anyone who can edit the file can sign in.

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password};

use aichat_core::session::gate::DEMO_EMAIL;
use aichat_core::session::profile::initials;
use aichat_core::session::{Navigation, View, resolve_view};
use aichat_types::profile::UserProfile;

use crate::state::AppState;

/// Sign in, prompting for whatever was not passed on the command line.
///
/// # Examples
///
/// ```bash
/// aichat login --email test@example.com
/// ```
pub async fn login(
    state: &AppState,
    email: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let mut gate = state.session_gate().await?;

    if let Navigation::Redirect(View::Chat) = resolve_view(View::Login, gate.is_authenticated()) {
        if let Some(profile) = gate.current() {
            if json {
                println!("{}", serde_json::to_string_pretty(profile)?);
            } else {
                println!();
                println!(
                    "  {} Already signed in as {}. Start chatting with {}",
                    style("i").blue().bold(),
                    style(&profile.email).cyan(),
                    style("aichat chat").yellow()
                );
                println!();
            }
            return Ok(());
        }
    }

    let email = match email {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .default(DEMO_EMAIL.to_string())
            .interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let profile = gate.login(&email, &password).await?.clone();
    tracing::info!(email = %profile.email, "signed in");

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Welcome, {}!",
        style("✓").green().bold(),
        style(&profile.name).cyan().bold()
    );
    println!("  {}", style("Start chatting with: aichat chat").dim());
    println!();
    Ok(())
}

/// Sign out. The profile record stays on disk for the next login.
pub async fn logout(state: &AppState, json: bool) -> Result<()> {
    let mut gate = state.session_gate().await?;
    let was_signed_in = gate.is_authenticated();
    gate.logout().await?;

    if json {
        println!("{}", serde_json::json!({ "signed_out": was_signed_in }));
    } else if was_signed_in {
        println!("\n  {} Signed out.\n", style("✓").green().bold());
    } else {
        println!("\n  {} Not signed in.\n", style("i").blue().bold());
    }
    Ok(())
}

/// Show who is signed in.
pub async fn whoami(state: &AppState, json: bool) -> Result<()> {
    let gate = state.session_gate().await?;
    let profile = gate.current();

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    match profile {
        Some(profile) => print_identity(profile),
        None => {
            println!();
            println!(
                "  {} Not signed in. Run {}",
                style("i").blue().bold(),
                style("aichat login").yellow()
            );
            println!();
        }
    }
    Ok(())
}

/// One-line identity: initials badge, name and email.
pub fn print_identity(profile: &UserProfile) {
    println!();
    println!(
        "  {} {} {}",
        style(format!("[{}]", initials(&profile.name))).cyan().bold(),
        style(&profile.name).bold(),
        style(format!("<{}>", profile.email)).dim()
    );
    println!();
}
