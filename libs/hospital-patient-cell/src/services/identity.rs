use rand::Rng;

pub const PATIENT_CODE_LENGTH: usize = 9;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces candidate patient codes. Implementations give no uniqueness
/// guarantee; callers retry against the store.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Uniform draws from `[A-Z0-9]` using the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeSource;

impl CodeSource for RandomCodeSource {
    fn next_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..PATIENT_CODE_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

pub fn is_valid_patient_code(code: &str) -> bool {
    code.len() == PATIENT_CODE_LENGTH && code.bytes().all(|b| ALPHABET.contains(&b))
}
