use chrono::{DateTime, Utc};

/// Formats a timestamp the way Daraja expects it (`YYYYMMDDHHmmss`, provider-local time is not required).
pub fn daraja_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// The STK password field is `base64(shortcode + passkey + timestamp)`, recomputed for every request.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    base64::encode(format!("{shortcode}{passkey}{timestamp}"))
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamp_format() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 5).unwrap();
        assert_eq!(daraja_timestamp(at), "20240229133005");
    }

    #[test]
    fn password_is_base64_of_concatenation() {
        let pw = stk_password("174379", "passkey", "20240229133005");
        assert_eq!(base64::decode(&pw).unwrap(), b"174379passkey20240229133005");
    }
}
