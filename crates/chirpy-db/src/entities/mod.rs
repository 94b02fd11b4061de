//! Database entities

pub mod chirp;
pub mod user;

pub use chirp::Entity as Chirp;
pub use user::Entity as User;

pub mod prelude {
    pub use super::chirp::Entity as Chirp;
    pub use super::user::Entity as User;
}
