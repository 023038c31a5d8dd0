use rand::RngCore;
use rand_core::OsRng;
use zeroize::Zeroize;

/// Fills a fixed-size array with bytes from the operating system CSPRNG.
pub fn random_bytes_fixed<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Draws fresh `N`-byte candidates until `accept` returns `true`.
///
/// Gives up after `max_attempts` draws and returns `None`. Rejected
/// candidates are wiped before the next draw.
pub fn random_bytes_where<const N: usize, F>(max_attempts: usize, mut accept: F) -> Option<[u8; N]>
where
    F: FnMut(&[u8; N]) -> bool,
{
    for _ in 0..max_attempts {
        let mut candidate = random_bytes_fixed::<N>();
        if accept(&candidate) {
            return Some(candidate);
        }
        candidate.zeroize();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_arrays_have_requested_size() {
        let a: [u8; 16] = random_bytes_fixed();
        let b: [u8; 32] = random_bytes_fixed();
        assert_eq!(a.len(), 16);
        assert_eq!(b.len(), 32);
    }

    #[test]
    fn fixed_arrays_are_not_all_zero() {
        // 2^-256 chance of a false failure.
        let buf: [u8; 32] = random_bytes_fixed();
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn consecutive_draws_differ() {
        let a: [u8; 32] = random_bytes_fixed();
        let b: [u8; 32] = random_bytes_fixed();
        assert_ne!(a, b);
    }

    #[test]
    fn where_returns_first_accepted_candidate() {
        let got: Option<[u8; 32]> = random_bytes_where(10, |_| true);
        assert!(got.is_some());
    }

    #[test]
    fn where_counts_attempts() {
        let mut calls = 0;
        let got: Option<[u8; 8]> = random_bytes_where(5, |_| {
            calls += 1;
            false
        });
        assert!(got.is_none());
        assert_eq!(calls, 5);
    }

    #[test]
    fn where_retries_until_predicate_holds() {
        let mut calls = 0;
        let got: Option<[u8; 8]> = random_bytes_where(10, |_| {
            calls += 1;
            calls == 3
        });
        assert!(got.is_some());
        assert_eq!(calls, 3);
    }

    #[test]
    fn where_with_zero_attempts_never_draws() {
        let got: Option<[u8; 4]> = random_bytes_where(0, |_| true);
        assert!(got.is_none());
    }
}
