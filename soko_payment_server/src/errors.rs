use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use soko_order_engine::{OrderFlowError, OrderQueryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Cannot process the order. {0}")]
    OrderFlowError(OrderFlowError),
    #[error("The payment provider could not be reached. {0}")]
    PaymentProviderError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingIdentityHeader => StatusCode::UNAUTHORIZED,
                AuthError::MalformedIdentityHeader(_) => StatusCode::BAD_REQUEST,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::OrderFlowError(e) => match e {
                OrderFlowError::DatabaseError(_) | OrderFlowError::QueryError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                },
                OrderFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::NotAuthorized(_) => StatusCode::FORBIDDEN,
                OrderFlowError::EmptyCart |
                OrderFlowError::ShippingAddressRequired |
                OrderFlowError::ProductNotFound(_) |
                OrderFlowError::ItemUnavailable { .. } |
                OrderFlowError::InvalidPhoneNumber(_) |
                OrderFlowError::AmountMismatch { .. } |
                OrderFlowError::OrderAlreadyPaid(_) |
                OrderFlowError::PaymentNotInitiated(_) |
                OrderFlowError::OrderModificationNoOp |
                OrderFlowError::OrderModificationForbidden { .. } => StatusCode::BAD_REQUEST,
            },
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        Self::OrderFlowError(e)
    }
}

impl From<OrderQueryError> for ServerError {
    fn from(e: OrderQueryError) -> Self {
        Self::BackendError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("The gateway did not assert a caller identity.")]
    MissingIdentityHeader,
    #[error("The asserted caller identity could not be read. {0}")]
    MalformedIdentityHeader(String),
    #[error("This host may not post payment callbacks.")]
    ForbiddenPeer,
}
