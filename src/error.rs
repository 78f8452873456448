use derive_new::new;

#[derive(Debug)]
pub enum ErrorType {
    Error,
    IOError,
    ConfigError,
    LoadGraphError,
    GraphError,
    VerifyError,
    SerdeError,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, new)]
pub struct DeltaSurgeError {
    error_type: ErrorType,
    message: String,
}

pub fn ds_error(message: String) -> DeltaSurgeError {
    DeltaSurgeError::new(ErrorType::Error, message)
}

pub fn io_error(message: String) -> DeltaSurgeError {
    DeltaSurgeError::new(ErrorType::IOError, message)
}

pub fn config_error(message: String) -> DeltaSurgeError {
    DeltaSurgeError::new(ErrorType::ConfigError, message)
}

pub fn load_graph_error(message: String) -> DeltaSurgeError {
    DeltaSurgeError::new(ErrorType::LoadGraphError, message)
}

pub fn graph_error(message: String) -> DeltaSurgeError {
    DeltaSurgeError::new(ErrorType::GraphError, message)
}

pub fn verify_error(message: String) -> DeltaSurgeError {
    DeltaSurgeError::new(ErrorType::VerifyError, message)
}

pub fn serde_error(message: String) -> DeltaSurgeError {
    DeltaSurgeError::new(ErrorType::SerdeError, message)
}

impl std::fmt::Display for DeltaSurgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error_type, self.message)
    }
}
