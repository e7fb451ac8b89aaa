use crate::{device::Device, dtype::DType};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    DTypeMismatch {
        expected: DType,
        got: DType,
    },
    DeviceMismatch {
        expected: Device,
        got: Device,
    },
    UnsupportedDType,
    InvalidArgument(String),
    InvalidState(String),
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    Lock,
    // autograd
    UseAfterRelease,
    GradientArityMismatch {
        node: String,
        expected: usize,
        got: usize,
    },
    SpuriousGradient {
        node: String,
        position: usize,
    },
    NodeDisposed,
    SavedValueModified {
        node: String,
        output_nr: usize,
        saved_version: u64,
        current_version: u64,
    },
    LeafModifiedInPlace,
    //
    Internal {
        message: String,
    },
    External {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DTypeMismatch { expected, got } => {
                write!(f, "DType mismatch: expected {:?}, got {:?}", expected, got)
            }
            Self::DeviceMismatch { expected, got } => {
                write!(f, "Device mismatch: expected {}, got {}", expected.name(), got.name())
            }
            Self::UnsupportedDType => write!(f, "Unsupported data type"),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::ShapeMismatch { expected, got } => {
                write!(f, "Shape mismatch: expected {:?}, got {:?}", expected, got)
            }
            Self::Lock => write!(f, "Lock is poisoned"),

            Self::UseAfterRelease => write!(
                f,
                "Trying to backward through the graph a second time (or directly access saved variables after they \
                 have already been freed). Saved intermediate values of the graph are freed when you call backward. \
                 Specify retain_graph=true if you need to backward through the graph a second time"
            ),
            Self::GradientArityMismatch { node, expected, got } => {
                write!(
                    f,
                    "function {} returned an incorrect number of gradients (expected {}, got {})",
                    node, expected, got
                )
            }
            Self::SpuriousGradient { node, position } => {
                write!(
                    f,
                    "function {} returned a gradient different than None at position {}, but the corresponding \
                     forward input was not a Variable",
                    node, position
                )
            }
            Self::NodeDisposed => write!(f, "Graph node has already been destroyed"),
            Self::SavedValueModified {
                node,
                output_nr,
                saved_version,
                current_version,
            } => {
                write!(
                    f,
                    "one of the variables needed for gradient computation has been modified by an inplace \
                     operation: output {} of {} is at version {}; expected version {} instead",
                    output_nr, node, current_version, saved_version
                )
            }
            Self::LeafModifiedInPlace => {
                write!(f, "a leaf Variable that requires grad has been used in an in-place operation")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
            Self::External { message } => {
                write!(f, "External error: {}", message)
            }
        }
    }
}

impl std::error::Error for Error {}
