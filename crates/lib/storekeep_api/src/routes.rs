//! Route path constants shared by the router and its tests.

pub const GET_PING: &str = "/ping";

pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const POST_AUTH_REGISTER: &str = "/auth/register";
/// Older clients register through this path.
pub const POST_AUTH_CREATE: &str = "/auth/create";
pub const POST_AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_AUTH_ME: &str = "/auth/me";
pub const PUT_AUTH_PASSWORD: &str = "/auth/password";

pub const USERS: &str = "/users";
pub const USERS_ID: &str = "/users/{id}";
pub const PUT_USERS_ID_ACTIVE: &str = "/users/{id}/active";

pub const PRODUCTS: &str = "/products";
pub const PRODUCTS_ID: &str = "/products/{id}";
