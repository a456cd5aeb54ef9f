// Keyforge - Parameters Module
//
// Resolves alias, password and certificate subject for a request.

mod identity;
mod resolver;
mod subject;

pub use identity::random_subject;
pub use resolver::{
    split_text_request, Credentials, KeystoreParameters, ParameterResolver, TextRequest,
    DEFAULT_ALIAS, DEFAULT_PASSWORD,
};
pub use subject::Subject;
