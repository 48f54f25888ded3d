//! Async I/O round trip through the `IOManager` singleton — spec.md §8
//! scenario 5.

use std::sync::{Arc, Mutex};

use cadence::io::{AsyncBuffer, AsyncInputStream, AsyncOutputStream, IOManager};
use cadence::runner::TaskRunnerConfig;
use serial_test::serial;

fn filled_store(values: &[u32]) -> Arc<Mutex<cadence::io::mem::MemoryInputStream>> {
    let mut out = cadence::io::mem::MemoryOutputStream::new();
    for value in values {
        use cadence::io::stream::DataOutputStream;
        out.write_u32(*value).expect("write should succeed");
    }
    Arc::new(Mutex::new(cadence::io::mem::MemoryInputStream::new(out.into_inner())))
}

#[test]
#[serial]
fn async_read_u32_round_trips_through_the_io_manager() {
    IOManager::destroy_instance();
    IOManager::initialize_instance(TaskRunnerConfig::default());

    let store = filled_store(&[1, 2, 3, 4]);
    let async_stream = AsyncInputStream::new(store);

    let result = async_stream.async_read_u32(4).expect("should queue onto the io manager");
    assert!(result.wait_for_result());

    assert_eq!(result.bytes_transferred(), 16);
    assert!(result.task_is_cleared());
    result.with_buffer(|buffer| match buffer {
        AsyncBuffer::U32(values) => assert_eq!(values, &vec![1, 2, 3, 4]),
        _ => panic!("expected a U32 buffer"),
    });

    IOManager::destroy_instance();
}

#[test]
#[serial]
fn async_write_then_read_cstr_round_trips() {
    IOManager::destroy_instance();
    IOManager::initialize_instance(TaskRunnerConfig::default());

    let sink = Arc::new(Mutex::new(cadence::io::mem::MemoryOutputStream::new()));
    let async_out = AsyncOutputStream::new(sink.clone());
    let write_result = async_out
        .async_write_cstr("hello".to_string())
        .expect("should queue onto the io manager");
    assert!(write_result.wait_for_result());

    let bytes = sink.lock().expect("sink mutex poisoned").as_slice().to_vec();
    let source = Arc::new(Mutex::new(cadence::io::mem::MemoryInputStream::new(bytes)));
    let async_in = AsyncInputStream::new(source);
    let read_result = async_in.async_read_cstr().expect("should queue onto the io manager");
    assert!(read_result.wait_for_result());

    read_result.with_buffer(|buffer| match buffer {
        AsyncBuffer::CString(value) => assert_eq!(value, "hello"),
        _ => panic!("expected a CString buffer"),
    });

    IOManager::destroy_instance();
}

#[test]
#[serial]
fn async_call_before_initialization_is_a_typed_error() {
    IOManager::destroy_instance();

    let store = filled_store(&[1]);
    let async_stream = AsyncInputStream::new(store);
    assert!(async_stream.async_read_u32(1).is_err());
}
