//! Unit tests for error.rs

use crate::error::{Error, Result};

// ============================================================================
// Tests: Display
// ============================================================================

#[test]
fn test_display_prefixes_each_kind() {
    let cases = [
        (Error::BackendError("vkCreateShaderModule: -3".to_string()), "Backend error: vkCreateShaderModule: -3"),
        (Error::OutOfMemory, "Out of GPU memory"),
        (Error::InvalidResource("entry point 'main' missing".to_string()), "Invalid resource: entry point 'main' missing"),
        (Error::InitializationFailed("no pipeline cache".to_string()), "Initialization failed: no pipeline cache"),
        (Error::Unsupported("subpass 1".to_string()), "Unsupported: subpass 1"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn test_debug_names_the_variant() {
    assert!(format!("{:?}", Error::OutOfMemory).contains("OutOfMemory"));
    assert!(format!("{:?}", Error::Unsupported("x".to_string())).contains("Unsupported"));
}

// ============================================================================
// Tests: Propagation
// ============================================================================

#[test]
fn test_boxes_as_std_error() {
    let boxed: Box<dyn std::error::Error> = Box::new(Error::InvalidResource("layout".to_string()));
    assert_eq!(boxed.to_string(), "Invalid resource: layout");
}

#[test]
fn test_question_mark_keeps_the_variant() {
    fn compile() -> Result<u32> {
        Err(Error::Unsupported("sparse binding".to_string()))
    }
    fn link() -> Result<u32> {
        let module = compile()?;
        Ok(module + 1)
    }

    match link() {
        Err(Error::Unsupported(msg)) => assert_eq!(msg, "sparse binding"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_clone_is_equal_in_display() {
    let err = Error::BackendError("device lost".to_string());
    assert_eq!(err.clone().to_string(), err.to_string());
}
