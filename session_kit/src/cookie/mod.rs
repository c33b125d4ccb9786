mod codec;
mod errors;
mod jar;

pub use codec::{CookieCodec, MIN_SECRET_LEN, TokenCodec};
pub use errors::CookieError;
pub use jar::{
    CookieOptions, SameSite, delete_cookie, get_cookie, get_encrypted_cookie, get_signed_cookie,
    set_cookie, set_encrypted_cookie, set_signed_cookie,
};
