pub use crate::route::model::UsernameInput;
