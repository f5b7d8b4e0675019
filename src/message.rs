use log::trace;
use std::io::{Error, ErrorKind};
use std::vec::Vec;

#[derive(Debug)]
pub struct HeaderMap {
    headers: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> HeaderMap {
        HeaderMap {
            headers: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: String, value: String) {
        trace!("storing header {:?}", name);
        self.headers.push((name, value));
    }

    // first occurrence wins, names match case-insensitively
    pub fn get(&self, name: &str) -> Option<String> {
        match self
            .headers
            .iter()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
        {
            Some((found_name, found_value)) => {
                trace!("found value {:?} for header {:?}", found_value, found_name);
                Some(String::from(found_value))
            }
            None => {
                trace!("header {:?} not found", name);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/**
 * Parse raw message text into a HeaderMap. Folded header values come back
 * unfolded as a single line.
 */
pub fn parse_headers(raw: &str) -> std::io::Result<HeaderMap> {
    let parsed;
    match mailparse::parse_mail(raw.as_bytes()) {
        Ok(parsed_read) => parsed = parsed_read,
        Err(e) => {
            return Err(Error::new(
                ErrorKind::Other,
                format!("Bad message: {}", e),
            ));
        }
    }

    let mut headers = HeaderMap::new();
    for header in parsed.headers.iter() {
        headers.insert(header.get_key(), header.get_value());
    }
    trace!("parsed {:?} headers", headers.len());

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_from_raw_text() {
        let raw = "Received-SPF: pass\r\nTo: alice@example.com\r\n\r\nbody\r\n";
        let headers = parse_headers(raw).unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Received-SPF"), Some(String::from("pass")));
        assert_eq!(headers.get("To"), Some(String::from("alice@example.com")));
        assert_eq!(headers.get("Subject"), None);
    }

    #[test]
    fn duplicate_headers_collapse_to_first_occurrence() {
        let raw = "Received: from relay-a (10.0.0.1)\r\nReceived: from relay-b (10.0.0.2)\r\n\r\n";
        let headers = parse_headers(raw).unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.get("Received"),
            Some(String::from("from relay-a (10.0.0.1)"))
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(String::from("received-spf"), String::from("softfail"));

        assert_eq!(headers.get("Received-SPF"), Some(String::from("softfail")));
    }

    #[test]
    fn folded_header_values_come_back_on_one_line() {
        let raw = "Received: from mail.example.com\r\n (10.1.2.3) by mx.example.net\r\n\r\n";
        let headers = parse_headers(raw).unwrap();

        let received = headers.get("Received").unwrap();
        assert!(!received.contains('\n'));
        assert!(received.contains("10.1.2.3"));
    }

    #[test]
    fn message_with_no_headers_gives_empty_map() {
        let headers = parse_headers("\r\njust a body\r\n").unwrap();
        assert!(headers.is_empty());
    }
}
