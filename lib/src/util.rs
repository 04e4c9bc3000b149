use crate::constants::TRANS_ID_WORDS;
use crate::header::TransId;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt::Write as _;
use std::sync::{Mutex, OnceLock};

// 进程内共享, 只从系统熵源播种一次
static TRANS_ID_RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();

pub fn print_bytes(buf: &[u8], separator: &str, row_width: usize) -> String {
    let mut hex = String::new();
    buf.iter().enumerate().for_each(|(x, y)| {
        let _ = write!(hex, "{:02X}", y);
        if (x + 1) % row_width == 0 {
            hex.push('\n');
        } else {
            hex.push_str(separator);
        }
    });

    hex
}

pub fn generate_transaction_id() -> TransId {
    let rng = TRANS_ID_RNG.get_or_init(|| Mutex::new(StdRng::from_entropy()));

    // a poisoned lock still holds a usable generator
    let mut rng = match rng.lock() {
        Ok(v) => v,
        Err(e) => e.into_inner(),
    };

    let mut words = [0_u32; TRANS_ID_WORDS];
    for word in words.iter_mut() {
        *word = rng.next_u32();
    }
    TransId::new(words)
}
