//! Domain models for the API.
//!
//! Row types decode with `sqlx::FromRow`; response types serialize to the JSON
//! the frontend consumes.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{CartItem, CartItemInput, CartItemRow};
pub use catalog::{
    Jersey, JerseyImage, JerseyImageInput, JerseyInput, JerseyType, JerseyTypeInput, League,
    LeagueInput, Team, TeamInput, TeamRef,
};
pub use order::{Order, OrderDetail, OrderInput, OrderItem, OrderItemRow};
pub use user::{Address, AddressInput, NewUser, Profile, User, UserImage, UserWithHash};
