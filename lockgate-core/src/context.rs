//! Per-request metadata handed to the guard by the host request layer.

/// Maximum stored length of a client network address (IPv6 text form).
pub const MAX_ADDRESS_LEN: usize = 39;

/// Maximum stored length of a client software descriptor.
pub const MAX_AGENT_LEN: usize = 255;

/// Advisory client metadata attached to failed attempt records.
///
/// Both fields are best-effort and log-only: they never influence the lock
/// decision. They are length-capped at construction so that arbitrarily long
/// client-supplied headers cannot bloat the attempt log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    source_address: String,
    agent: String,
}

impl RequestContext {
    /// Build a context from raw request parts.
    ///
    /// The source address is the first entry of a forwarded-for header when
    /// present, else the direct peer address, else empty. The agent is the
    /// client-supplied software identifier, else empty.
    pub fn from_parts(
        forwarded_for: Option<&str>,
        peer_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Self {
        let source_address = forwarded_for
            .map(|h| h.split(',').next().unwrap_or("").trim())
            .filter(|s| !s.is_empty())
            .or(peer_address)
            .unwrap_or("");

        Self {
            source_address: truncate(source_address, MAX_ADDRESS_LEN),
            agent: truncate(user_agent.unwrap_or(""), MAX_AGENT_LEN),
        }
    }

    /// A context with no client metadata.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Best-effort client network address; empty if unknown.
    pub fn source_address(&self) -> &str {
        &self.source_address
    }

    /// Best-effort client software descriptor; empty if unknown.
    pub fn agent(&self) -> &str {
        &self.agent
    }
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_takes_precedence() {
        let ctx = RequestContext::from_parts(Some("8.8.8.8"), Some("127.0.0.1"), None);
        assert_eq!(ctx.source_address(), "8.8.8.8");
    }

    #[test]
    fn test_forwarded_for_uses_first_entry() {
        let ctx = RequestContext::from_parts(Some("8.8.8.8, 9.9.9.9"), Some("127.0.0.1"), None);
        assert_eq!(ctx.source_address(), "8.8.8.8");
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let ctx = RequestContext::from_parts(Some(""), Some("127.0.0.1"), None);
        assert_eq!(ctx.source_address(), "127.0.0.1");

        let ctx = RequestContext::from_parts(None, Some("127.0.0.1"), None);
        assert_eq!(ctx.source_address(), "127.0.0.1");
    }

    #[test]
    fn test_empty_when_nothing_known() {
        let ctx = RequestContext::from_parts(None, None, None);
        assert_eq!(ctx.source_address(), "");
        assert_eq!(ctx.agent(), "");
    }

    #[test]
    fn test_agent_is_capped() {
        let long_agent = "a".repeat(300);
        let ctx = RequestContext::from_parts(None, None, Some(&long_agent));
        assert_eq!(ctx.agent().len(), MAX_AGENT_LEN);
    }

    #[test]
    fn test_address_is_capped() {
        let long_addr = "1".repeat(64);
        let ctx = RequestContext::from_parts(None, Some(&long_addr), None);
        assert_eq!(ctx.source_address().len(), MAX_ADDRESS_LEN);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 'é' is two bytes; cutting at 3 would split the second one
        assert_eq!(truncate("ééé", 3), "é");
    }
}
