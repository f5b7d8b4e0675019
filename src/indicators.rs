use crate::message::HeaderMap;
use log::trace;
use regex::Regex;

#[derive(Debug)]
pub struct IndicatorRecord {
    pub spf: String,
    pub dkim: String,
    pub dmarc: String,
    pub source_ip: String,
    pub destination: String,
}

#[derive(Debug)]
pub struct ResultEntry {
    pub file_name: String,
    pub indicators: IndicatorRecord,
}

/**
 * Pull the authentication and routing indicators out of one message's
 * headers. Header values are surfaced verbatim; nothing here checks that
 * an SPF result is valid or that a DKIM signature verifies.
 */
pub fn extract_indicators(headers: &HeaderMap) -> IndicatorRecord {
    trace!("extracting indicators from {:?} headers", headers.len());

    let spf = match headers.get("Received-SPF") {
        Some(spf_value) => spf_value,
        None => String::from("Not Found"),
    };

    // DKIM and DMARC are both reported straight from Authentication-Results;
    // the dkim= and dmarc= tokens inside that value are not picked apart.
    let dkim = match headers.get("Authentication-Results") {
        Some(auth_results_value) => auth_results_value,
        None => String::from("Not Found"),
    };
    let dmarc = dkim.clone();

    let source_ip = match headers.get("Received") {
        Some(received_value) => match first_ipv4(&received_value) {
            Some(ip_found) => ip_found,
            None => String::from("Not Found"),
        },
        None => String::from("Not Found"),
    };

    let destination = match headers.get("To") {
        Some(to_value) => to_value,
        None => String::new(),
    };

    IndicatorRecord {
        spf: spf,
        dkim: dkim,
        dmarc: dmarc,
        source_ip: source_ip,
        destination: destination,
    }
}

/**
 * Find the first IPv4-looking substring in a Received header value. The
 * match is syntactic only, octets are not range checked.
 */
fn first_ipv4(received: &str) -> Option<String> {
    let ip_pattern = Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap();
    match ip_pattern.find(received) {
        Some(ip_match) => {
            trace!("found ip {:?}", ip_match.as_str());
            Some(String::from(ip_match.as_str()))
        }
        None => {
            trace!("no ip found in Received value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_from(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(String::from(*name), String::from(*value));
        }
        headers
    }

    #[test]
    fn missing_headers_give_sentinels_and_empty_destination() {
        let headers = headers_from(&[("Subject", "hello")]);
        let indicators = extract_indicators(&headers);

        assert_eq!(indicators.spf, "Not Found");
        assert_eq!(indicators.dkim, "Not Found");
        assert_eq!(indicators.dmarc, "Not Found");
        assert_eq!(indicators.source_ip, "Not Found");
        assert_eq!(indicators.destination, "");
    }

    #[test]
    fn dkim_and_dmarc_always_match() {
        let with_auth = headers_from(&[("Authentication-Results", "dkim=pass; dmarc=fail")]);
        let without_auth = headers_from(&[("To", "bob@example.com")]);

        let indicators = extract_indicators(&with_auth);
        assert_eq!(indicators.dkim, indicators.dmarc);
        assert_eq!(indicators.dkim, "dkim=pass; dmarc=fail");

        let indicators = extract_indicators(&without_auth);
        assert_eq!(indicators.dkim, indicators.dmarc);
    }

    #[test]
    fn extraction_is_idempotent() {
        let headers = headers_from(&[
            ("Received-SPF", "neutral"),
            ("Received", "from a (192.168.0.5) by b"),
        ]);

        let first = extract_indicators(&headers);
        let second = extract_indicators(&headers);

        assert_eq!(first.spf, second.spf);
        assert_eq!(first.dkim, second.dkim);
        assert_eq!(first.dmarc, second.dmarc);
        assert_eq!(first.source_ip, second.source_ip);
        assert_eq!(first.destination, second.destination);
    }

    #[test]
    fn ip_match_is_syntactic_not_range_checked() {
        let headers = headers_from(&[("Received", "from x by y; 999.999.999.999")]);
        let indicators = extract_indicators(&headers);

        assert_eq!(indicators.source_ip, "999.999.999.999");
    }

    #[test]
    fn first_ip_in_received_value_wins() {
        let headers = headers_from(&[(
            "Received",
            "from relay (10.0.0.1) by mx (10.0.0.2) with ESMTP",
        )]);
        let indicators = extract_indicators(&headers);

        assert_eq!(indicators.source_ip, "10.0.0.1");
    }

    #[test]
    fn received_without_any_ip_gives_sentinel() {
        let headers = headers_from(&[("Received", "from relay.example.com by mx.example.net")]);
        let indicators = extract_indicators(&headers);

        assert_eq!(indicators.source_ip, "Not Found");
    }

    #[test]
    fn well_formed_message_yields_all_five_indicators() {
        let headers = headers_from(&[
            ("Received-SPF", "pass"),
            ("Authentication-Results", "dkim=pass"),
            ("Received", "from mail.example.com (10.1.2.3) by mx.example.net"),
            ("To", "alice@example.com"),
        ]);
        let indicators = extract_indicators(&headers);

        assert_eq!(indicators.spf, "pass");
        assert_eq!(indicators.dkim, "dkim=pass");
        assert_eq!(indicators.dmarc, "dkim=pass");
        assert_eq!(indicators.source_ip, "10.1.2.3");
        assert_eq!(indicators.destination, "alice@example.com");
    }
}
