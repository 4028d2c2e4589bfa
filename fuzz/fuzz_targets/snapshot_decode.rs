#![no_main]

use libfuzzer_sys::fuzz_target;
use recuerdo::persist;

fuzz_target!(|data: &[u8]| {
    // Attempt to decode an arbitrary byte stream as a snapshot envelope.
    // Corrupt or truncated files must produce an error, never a panic.
    let _ = persist::decode(data);
});
