use std::panic::{self, AssertUnwindSafe};

use mdhtml_core::{Document, Options};

const CASES: usize = 200;
const MAX_LEN: usize = 512;
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 \
\n\t#@*`$[](){}!<>:+-_=./\\\\\"";

#[test]
fn pipeline_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x7f4a_2d91_13b4_55a1);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut doc = Document::new(Options::default());
            doc.read(&source).expect("open for input");
            doc.to_html()
        }));
        if result.is_err() {
            return Err(format!("pipeline panicked for case {}: {:?}", case, source).into());
        }
    }
    Ok(())
}

#[test]
fn rendering_twice_is_stable_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x91d4_2f8e_c1a3_044f);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let mut doc = Document::new(Options::default());
        doc.read(&source).expect("open for input");
        let first = doc.to_html();
        let second = doc.to_html();
        if first != second {
            return Err(format!("unstable output for case {}: {:?}", case, source).into());
        }
    }
    Ok(())
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn gen_range(&mut self, low: usize, high: usize) -> usize {
        low + (self.next() >> 33) as usize % (high - low)
    }
}

fn random_string(rng: &mut Lcg, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0, CHARSET.len());
        out.push(CHARSET[idx] as char);
    }
    out
}
