//! Which view a caller may see, given their sign-in state.

use std::fmt;

/// Top-level screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Login,
    Chat,
    Profile,
}

impl View {
    /// Views that require a signed-in user.
    pub fn is_protected(self) -> bool {
        matches!(self, View::Chat | View::Profile)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Home => write!(f, "home"),
            View::Login => write!(f, "login"),
            View::Chat => write!(f, "chat"),
            View::Profile => write!(f, "profile"),
        }
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Show the requested view.
    Render(View),
    /// Send the caller somewhere else instead.
    Redirect(View),
}

impl Navigation {
    /// The view that ends up on screen.
    pub fn target(self) -> View {
        match self {
            Navigation::Render(view) | Navigation::Redirect(view) => view,
        }
    }
}

/// Decide what to show for `requested`.
///
/// Home never renders: it forwards to chat or login. Signed-in users are
/// bounced from the login screen to chat; anonymous users are bounced
/// from protected views to login.
pub fn resolve_view(requested: View, authenticated: bool) -> Navigation {
    match (requested, authenticated) {
        (View::Home, true) | (View::Login, true) => Navigation::Redirect(View::Chat),
        (View::Home, false) => Navigation::Redirect(View::Login),
        (view, false) if view.is_protected() => Navigation::Redirect(View::Login),
        (view, _) => Navigation::Render(view),
    }
}
