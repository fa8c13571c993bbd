//! Shop error taxonomy shared by the catalog, cart and order services.

use thiserror::Error;

use skateparadise_core::checkout::CheckoutError;
use skateparadise_core::stock::StockError;

use crate::db::RepositoryError;

/// Errors returned by shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The addressed entity does not exist (names the kind of entity).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// No open cart matches the given code or user.
    #[error("cart not found")]
    CartNotFound,

    /// The product is sold in sizes and none was given.
    #[error("a size is required for this product")]
    SizeRequired,

    /// Fewer units are available than requested.
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i32,
        available: i32,
    },

    /// Not a known order status.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Input rejected by a business rule.
    #[error("{0}")]
    Validation(String),

    /// The operation clashes with existing state.
    #[error("{0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ShopError {
    /// Translate a ledger error for `product`.
    #[must_use]
    pub fn from_stock(product: &str, err: StockError) -> Self {
        match err {
            StockError::SizeRequired => Self::SizeRequired,
            StockError::Insufficient {
                requested,
                available,
            } => Self::InsufficientStock {
                product: product.to_owned(),
                requested,
                available,
            },
            StockError::DuplicateSize(_) => Self::Conflict(err.to_string()),
            StockError::UnknownSize(_)
            | StockError::SizeNotOffered
            | StockError::MixedSizing
            | StockError::NegativeStock => Self::Validation(err.to_string()),
        }
    }

    /// Map `RepositoryError::NotFound` to `NotFound(what)`.
    pub(crate) fn or_not_found(what: &'static str) -> impl Fn(RepositoryError) -> Self {
        move |err| match err {
            RepositoryError::NotFound => Self::NotFound(what),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl From<CheckoutError> for ShopError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::Validation("cart is empty".to_owned()),
            CheckoutError::MissingLedger(id) => Self::Repository(RepositoryError::DataCorruption(
                format!("no stock ledger loaded for product {id}"),
            )),
            CheckoutError::Stock {
                product_name,
                source,
                ..
            } => Self::from_stock(&product_name, source),
        }
    }
}
