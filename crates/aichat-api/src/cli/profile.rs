//! Profile CLI commands: show and edit the signed-in profile.

use std::path::Path;

use anyhow::Result;
use console::style;

use aichat_core::attachment::{DataUrl, encode_data_url, format_size};
use aichat_core::session::profile::{ProfileForm, ensure_avatar_type};
use aichat_core::session::{Navigation, View, resolve_view};
use aichat_infra::filesystem::read_pending_file;
use aichat_types::profile::UserProfile;

use crate::cli::session::print_identity;
use crate::state::AppState;

fn sign_in_hint() {
    println!();
    println!(
        "  {} Sign in to view your profile: run {}",
        style("!").yellow().bold(),
        style("aichat login").yellow()
    );
    println!();
}

/// Show the signed-in profile.
pub async fn show_profile(state: &AppState, json: bool) -> Result<()> {
    let gate = state.session_gate().await?;
    let Navigation::Render(_) = resolve_view(View::Profile, gate.is_authenticated()) else {
        sign_in_hint();
        return Ok(());
    };
    let Some(profile) = gate.current() else {
        sign_in_hint();
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
        return Ok(());
    }
    print_profile(profile);
    Ok(())
}

/// Edit the signed-in profile. Fields left as `None` keep their value.
///
/// # Examples
///
/// ```bash
/// aichat profile set --name "Ada Lovelace" --avatar ./ada.png
/// aichat profile set --clear-avatar
/// ```
pub async fn set_profile(
    state: &AppState,
    name: Option<String>,
    email: Option<String>,
    avatar: Option<&Path>,
    clear_avatar: bool,
    json: bool,
) -> Result<()> {
    let mut gate = state.session_gate().await?;
    let Navigation::Render(_) = resolve_view(View::Profile, gate.is_authenticated()) else {
        sign_in_hint();
        return Ok(());
    };
    let Some(current) = gate.current().cloned() else {
        sign_in_hint();
        return Ok(());
    };

    let avatar_url = if clear_avatar {
        None
    } else if let Some(path) = avatar {
        let file = read_pending_file(path).await?;
        ensure_avatar_type(&file.content_type)?;
        Some(encode_data_url(&file.content_type, &file.bytes))
    } else {
        current.avatar_url.clone()
    };

    let form = ProfileForm {
        name: name.unwrap_or(current.name),
        email: email.unwrap_or(current.email),
        avatar_url,
    };
    let updated = gate.update_profile(form.into_update()?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(updated)?);
        return Ok(());
    }
    println!("\n  {} Profile saved.", style("✓").green().bold());
    print_profile(updated);
    Ok(())
}

fn print_profile(profile: &UserProfile) {
    print_identity(profile);
    let avatar = match profile.avatar_url.as_deref().map(DataUrl::parse) {
        Some(Ok(url)) => {
            let size = url.decode().map(|bytes| bytes.len() as u64).unwrap_or_default();
            format!("{} ({})", url.mime(), format_size(size))
        }
        Some(Err(_)) => "unreadable image".to_string(),
        None => "none".to_string(),
    };
    println!("  {:<8} {}", style("Avatar").dim(), avatar);
    println!();
}
