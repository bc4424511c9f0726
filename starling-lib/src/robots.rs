//! The static robots.txt surface. Two variants, each with a stable MD5
//! ETag so conditional requests can short-circuit.

use crate::globals::GLOBALS;

pub const ROBOTS_TXT: &str = "\
User-agent: *
Crawl-delay: 500
# api stuff
Disallow: /api/
# auth/login stuff
Disallow: /auth/
Disallow: /oauth/
# well known stuff
Disallow: /.well-known/
# files
Disallow: /fileserver/
# s2s AP stuff
Disallow: /users/
Disallow: /emoji/
";

pub const ROBOTS_TXT_DISALLOW_NODEINFO: &str = "\
User-agent: *
Crawl-delay: 500
# api stuff
Disallow: /api/
# auth/login stuff
Disallow: /auth/
Disallow: /oauth/
# well known stuff
Disallow: /.well-known/
# nodeinfo
Disallow: /nodeinfo/
# files
Disallow: /fileserver/
# s2s AP stuff
Disallow: /users/
Disallow: /emoji/
";

lazy_static! {
    static ref ROBOTS_ETAG: String = format!("\"{:x}\"", md5::compute(ROBOTS_TXT.as_bytes()));
    static ref ROBOTS_NODEINFO_ETAG: String = format!(
        "\"{:x}\"",
        md5::compute(ROBOTS_TXT_DISALLOW_NODEINFO.as_bytes())
    );
}

/// The robots.txt body and its ETag, per instance settings.
pub fn robots_txt() -> (&'static str, &'static str) {
    if GLOBALS.settings.read().robots_deny_nodeinfo {
        (ROBOTS_TXT_DISALLOW_NODEINFO, ROBOTS_NODEINFO_ETAG.as_str())
    } else {
        (ROBOTS_TXT, ROBOTS_ETAG.as_str())
    }
}
