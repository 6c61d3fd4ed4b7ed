//! Role gating for application views.

use crate::session::SessionState;
use crate::types::BlogId;

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Member,
    Admin,
}

/// Views of the blogging front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    ForgotPassword,
    ResetPassword { uid: String, token: String },
    BlogDetail(BlogId),
    NewBlog,
    EditBlog(BlogId),
    MyBlogs,
    Profile,
    AdminDashboard,
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".into(),
            Self::Login => "/login".into(),
            Self::Register => "/register".into(),
            Self::ForgotPassword => "/forgot-password".into(),
            Self::ResetPassword { uid, token } => format!("/reset-password/{uid}/{token}"),
            Self::BlogDetail(id) => format!("/blogs/{id}"),
            Self::NewBlog => "/blogs/new".into(),
            Self::EditBlog(id) => format!("/blogs/edit/{id}"),
            Self::MyBlogs => "/my-blogs".into(),
            Self::Profile => "/profile".into(),
            Self::AdminDashboard => "/admin/dashboard".into(),
        }
    }

    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Self::Home
            | Self::Login
            | Self::Register
            | Self::ForgotPassword
            | Self::ResetPassword { .. } => Access::Public,
            // Blog detail fetches hit an authenticated endpoint.
            Self::BlogDetail(_) | Self::NewBlog | Self::EditBlog(_) | Self::MyBlogs | Self::Profile => {
                Access::Member
            }
            Self::AdminDashboard => Access::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Not logged in; come back to `next` after login.
    LoginRequired { next: String },
    /// Logged in without the required role.
    Forbidden,
}

impl Denial {
    /// Where to send the user instead.
    #[must_use]
    pub fn redirect(&self) -> String {
        match self {
            Self::LoginRequired { next } => {
                format!("/login?next={}", urlencoding::encode(next))
            }
            Self::Forbidden => Route::Home.path(),
        }
    }
}

/// Decide whether the current session may open `route`.
///
/// # Errors
///
/// Returns the [`Denial`] explaining where the user should go instead.
pub fn authorize(state: &SessionState, route: &Route) -> Result<(), Denial> {
    match (route.access(), state.identity()) {
        (Access::Public, _) => Ok(()),
        (_, None) => Err(Denial::LoginRequired { next: route.path() }),
        (Access::Member, Some(_)) => Ok(()),
        (Access::Admin, Some(identity)) if identity.is_admin => Ok(()),
        (Access::Admin, Some(_)) => Err(Denial::Forbidden),
    }
}

/// Post-login destination: `next` if it is a local absolute path, home otherwise.
#[must_use]
pub fn after_login(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_owned()
        }
        _ => Route::Home.path(),
    }
}
