//! Domain models for the marketplace API.
//!
//! These types represent validated domain objects separate from database row
//! types. Request payloads that only make sense for one resource live next to
//! that resource's model.

pub mod address;
pub mod artist;
pub mod buyer;
pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod review;
pub mod session;
pub mod user;
pub mod wishlist;

pub use address::ShippingAddress;
pub use artist::{ArtistProfile, ArtistPublicProfile, ArtistStats, UpdateArtistProfile};
pub use buyer::{BuyerProfile, UpdateBuyerProfile};
pub use cart::{AddToCart, Cart, CartLine, SetQuantity};
pub use category::{Category, NewCategory};
pub use order::{
    ArtistOrder, CreateOrder, Order, OrderItem, OrderLineInput, UpdateOrderStatus,
    UpdatePaymentStatus,
};
pub use product::{NewProduct, Product, ProductFilter, ProductListing, ProductSort, ProductUpdate};
pub use review::{ProductReviews, RatingSummary, Review, ReviewInput};
pub use session::keys as session_keys;
pub use user::User;
pub use wishlist::{AddToWishlist, WishlistEntry};
