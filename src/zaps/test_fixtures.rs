//! Signed zap fixtures shared by the zap and feed tests.
//!
//! Each zap request is a signed kind-9734 event; each invoice is a signed
//! mainnet bolt11 whose description hash commits to the matching request JSON.

use nostr_sdk::prelude::*;

use crate::types::ZAP_RECEIPT;

/// Secret key of the stream host that receives the fixture zaps.
pub const HOST_SECRET: &str = "1111111111111111111111111111111111111111111111111111111111111111";

pub const SENDER_PUBKEY: &str = "466d7fcae563e5cb09a0d1870bb580344804617879a14949cf22285f1bae3f27";

/// 21 000 sat zap request from `SENDER_PUBKEY` with the comment "Great stream!".
pub const ZAP_REQUEST_21K: &str = r#"{"id":"8b1f28131f8ef537cfbdf46d339be81626c6f15c129559363baf47b73f62be22","pubkey":"466d7fcae563e5cb09a0d1870bb580344804617879a14949cf22285f1bae3f27","created_at":1700000000,"kind":9734,"tags":[["p","4f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa"],["amount","21000000"],["relays","wss://relay.damus.io"],["a","30311:4f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa:stream-1"]],"content":"Great stream!","sig":"ba09dfa4b27fe93e866cb1beea356c01b450d607fef1a83f257827cfd0244604c421fb24774c6c4cebe58cd813754fa75adcf6435d86f31c6f41c790209c1c7b"}"#;

pub const INVOICE_21K: &str = "lnbc210u1pj48ugqpp5n0mtee0tn8xnljmffsfzmfnwvz4w73e0jd4nnvwegsdk7dz7uhessp5tvgkrrpwgsp8sa7se5yjrmgkdw03wm6stpluj8n4xnwjj3kmwltqhp56kx4nlhn4zujc35glzj8yufxpwc5w4t7se4c7wpqzlj0s80ch0uq9qrsgqy6wk947nryf7cpr029re7lefnq0w9xpkmsjxsa6etpqt3wgtg55nu9knhm7gnf9mk6ytj3pzpfmg3vcej8007u00rzannj7hh2ltuqcp29sd5j";

/// Anonymous 50 000 sat zap request with no comment.
pub const ZAP_REQUEST_ANON_50K: &str = r#"{"id":"8815823e8f8fe4cabc1199b8b333c3a188f3357fda6c651bd20cd1bd3e2f3ece","pubkey":"2c0b7cf95324a07d05398b240174dc0c2be444d96b159aa6c7f7b1e668680991","created_at":1700000100,"kind":9734,"tags":[["p","4f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa"],["amount","50000000"],["anon",""]],"content":"","sig":"fb6209fc280bef3f03f6bacbe2cc5f81910a450e63510d8abef232c1503361ee101092756977ba27b51a5eaf1f856d9ddf41b2960363da4d13325b6c65d0de86"}"#;

pub const INVOICE_ANON_50K: &str = "lnbc500u1pj48ugqpp5u3r37mdf9lf92ksdqfnn76j6ztsl7yk44lefe0avxy93uqyck4mssp5x53y6rf5vht5ap2l3456zdh8n36yag66vawn8yekpge8e0mrtx3qhp59tw6knxj9qvntz2xfzl4a8zss8e2x9p0gvm86znwzmqguyd2yjlq9qrsgq7kn8rpsg7cn6ja6szpewqjv9qq2y74c7mrlswt8yzuzl52e60kjrl70rrky9xght7x2dr69gf36d4favhm2vja0ceuwqt2amkfkhaqqq987qjt";

pub fn host_keys() -> Keys {
    Keys::parse(HOST_SECRET).unwrap()
}

/// Builds a receipt signed by a fresh "LNURL server" key.
pub fn receipt(
    receiver: &PublicKey,
    bolt11: &str,
    description: &str,
    created_at: u64,
) -> Event {
    let receiver_hex = receiver.to_hex();
    EventBuilder::new(Kind::from(ZAP_RECEIPT), "")
        .tags([
            Tag::parse(["p", receiver_hex.as_str()]).unwrap(),
            Tag::parse(["bolt11", bolt11]).unwrap(),
            Tag::parse(["description", description]).unwrap(),
        ])
        .custom_created_at(Timestamp::from(created_at))
        .sign_with_keys(&Keys::generate())
        .unwrap()
}

/// The valid 21k receipt addressed to the fixture host.
pub fn receipt_21k(created_at: u64) -> Event {
    receipt(
        &host_keys().public_key(),
        INVOICE_21K,
        ZAP_REQUEST_21K,
        created_at,
    )
}

/// The valid anonymous 50k receipt addressed to the fixture host.
pub fn receipt_anon_50k(created_at: u64) -> Event {
    receipt(
        &host_keys().public_key(),
        INVOICE_ANON_50K,
        ZAP_REQUEST_ANON_50K,
        created_at,
    )
}
