//! Parsed certificate data model consumed during path building and validation.
//!
//! The engine operates on already-parsed artifacts with typed fields; ASN.1/DER decoding is
//! the responsibility of the caller. Each certificate carries a derived to-be-signed (tbs)
//! encoding that is computed lazily once and cached; two certificates are considered equal
//! if and only if their tbs encodings are byte-identical.

use std::sync::OnceLock;

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES,
    ID_CE_CRL_DISTRIBUTION_POINTS, ID_CE_FRESHEST_CRL, ID_CE_INHIBIT_ANY_POLICY,
    ID_CE_KEY_USAGE, ID_CE_NAME_CONSTRAINTS, ID_CE_POLICY_CONSTRAINTS, ID_CE_POLICY_MAPPINGS,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER, ID_PE_AUTHORITY_INFO_ACCESS,
};
use der::asn1::ObjectIdentifier;
use flagset::{flags, FlagSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// OID for the PKCS#9 emailAddress attribute: 1.2.840.113549.1.9.1
pub const PKCS9_EMAIL_ADDRESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// OID for the rfc822Mailbox attribute from RFC 1274: 0.9.2342.19200300.100.1.3
pub const RFC1274_MAILBOX: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.3");

/// Serde adapter serializing [`ObjectIdentifier`] values as dot notation strings.
pub(crate) mod oid_serde {
    use der::asn1::ObjectIdentifier;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        oid: &ObjectIdentifier,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&oid.to_string())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<ObjectIdentifier, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Serde adapter serializing vectors of [`ObjectIdentifier`] values as dot notation strings.
pub(crate) mod oid_vec_serde {
    use der::asn1::ObjectIdentifier;
    use serde::ser::SerializeSeq;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        oids: &[ObjectIdentifier],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(oids.len()))?;
        for oid in oids {
            seq.serialize_element(&oid.to_string())?;
        }
        seq.end()
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<ObjectIdentifier>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| s.parse().map_err(D::Error::custom))
            .collect()
    }
}

flags! {
    /// Key usage values per RFC 5280 Section 4.2.1.3.
    pub enum KeyUsages: u16 {
        /// digitalSignature
        DigitalSignature = 0b0000_0000_0000_0001,
        /// nonRepudiation
        NonRepudiation = 0b0000_0000_0000_0010,
        /// keyEncipherment
        KeyEncipherment = 0b0000_0000_0000_0100,
        /// dataEncipherment
        DataEncipherment = 0b0000_0000_0000_1000,
        /// keyAgreement
        KeyAgreement = 0b0000_0000_0001_0000,
        /// keyCertSign
        KeyCertSign = 0b0000_0000_0010_0000,
        /// cRLSign
        CRLSign = 0b0000_0000_0100_0000,
        /// encipherOnly
        EncipherOnly = 0b0000_0000_1000_0000,
        /// decipherOnly
        DecipherOnly = 0b0000_0001_0000_0000,
    }
}

/// `AttributeTypeAndValue` is one typed attribute value within a name's RDN sequence.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AttributeTypeAndValue {
    /// Attribute type, e.g., id-at-commonName.
    #[serde(with = "oid_serde")]
    pub attr_type: ObjectIdentifier,
    /// Attribute value as a string.
    pub value: String,
}

impl AttributeTypeAndValue {
    /// Instantiates a new `AttributeTypeAndValue`.
    pub fn new(attr_type: ObjectIdentifier, value: &str) -> Self {
        AttributeTypeAndValue {
            attr_type,
            value: value.to_string(),
        }
    }
}

/// `Name` is an X.501 name represented as an ordered sequence of typed attribute values.
///
/// Structural equality (via `PartialEq`) is exact; use
/// [`compare_names`](crate::validator::name_match::compare_names) for the normalized
/// comparison applied during name chaining and issuer candidate discovery.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Name {
    /// Ordered attribute sequence, most significant attribute first.
    pub rdn_sequence: Vec<AttributeTypeAndValue>,
}

impl Name {
    /// Instantiates a new `Name` from an ordered attribute sequence.
    pub fn new(rdn_sequence: Vec<AttributeTypeAndValue>) -> Self {
        Name { rdn_sequence }
    }
}

/// `SerialNumber` is an arbitrary precision certificate serial number expressed as
/// big-endian bytes.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SerialNumber(pub Vec<u8>);

impl From<u64> for SerialNumber {
    fn from(value: u64) -> Self {
        SerialNumber(value.to_be_bytes().to_vec())
    }
}

/// `SubjectPublicKeyInfo` carries the public key of a certificate along with its algorithm.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SubjectPublicKeyInfo {
    /// Public key algorithm.
    #[serde(with = "oid_serde")]
    pub algorithm: ObjectIdentifier,
    /// Public key material, opaque to this crate.
    pub subject_public_key: Vec<u8>,
}

/// `GeneralName` is one typed name as used in subjectAltName values and name constraint
/// subtree bases.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GeneralName {
    /// rfc822Name, i.e., an email address.
    Rfc822Name(String),
    /// dNSName.
    DnsName(String),
    /// directoryName.
    DirectoryName(Name),
    /// uniformResourceIdentifier.
    UniformResourceIdentifier(String),
    /// iPAddress. Names are 4 (IPv4) or 16 (IPv6) bytes; constraint bases are 8 or 32
    /// bytes carrying an address followed by a mask.
    IpAddress(Vec<u8>),
}

/// `GeneralSubtree` is one entry in a permitted or excluded subtrees list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GeneralSubtree {
    /// Base name of the subtree.
    pub base: GeneralName,
}

impl GeneralSubtree {
    /// Instantiates a new `GeneralSubtree` for the given base name.
    pub fn new(base: GeneralName) -> Self {
        GeneralSubtree { base }
    }
}

/// `PolicyInformation` is one entry in a certificatePolicies extension.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PolicyInformation {
    /// Certificate policy OID.
    #[serde(with = "oid_serde")]
    pub policy_identifier: ObjectIdentifier,
    /// Policy qualifiers, carried opaquely; the engine does not interpret them.
    #[serde(default)]
    pub qualifiers: Vec<Vec<u8>>,
}

impl PolicyInformation {
    /// Instantiates a new `PolicyInformation` with no qualifiers.
    pub fn new(policy_identifier: ObjectIdentifier) -> Self {
        PolicyInformation {
            policy_identifier,
            qualifiers: Vec::new(),
        }
    }
}

/// `PolicyMapping` is one entry in a policyMappings extension.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PolicyMapping {
    /// Policy OID in the issuer's domain.
    #[serde(with = "oid_serde")]
    pub issuer_domain_policy: ObjectIdentifier,
    /// Policy OID in the subject's domain that is treated as equivalent.
    #[serde(with = "oid_serde")]
    pub subject_domain_policy: ObjectIdentifier,
}

/// `ExtensionValue` is the parsed value of a certificate extension relevant to path
/// building and validation. Extensions for which only presence matters during validation
/// (CRL distribution points, freshest CRL, authority information access) carry no fields.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum ExtensionValue {
    /// basicConstraints. Path length constraints are not modeled.
    BasicConstraints {
        /// cA field.
        ca: bool,
    },
    /// keyUsage.
    KeyUsage(FlagSet<KeyUsages>),
    /// authorityKeyIdentifier. Either the key identifier or the issuer/serial pair is
    /// populated, not both.
    AuthorityKeyIdentifier {
        /// keyIdentifier field, matched against issuer subjectKeyIdentifier values.
        key_identifier: Option<Vec<u8>>,
        /// authorityCertIssuer field.
        authority_cert_issuer: Option<Name>,
        /// authorityCertSerialNumber field.
        authority_cert_serial_number: Option<SerialNumber>,
    },
    /// subjectKeyIdentifier.
    SubjectKeyIdentifier(Vec<u8>),
    /// certificatePolicies.
    CertificatePolicies(Vec<PolicyInformation>),
    /// policyMappings.
    PolicyMappings(Vec<PolicyMapping>),
    /// policyConstraints. Values are skip-certificate counts per RFC 5280 Section 4.2.1.11.
    PolicyConstraints {
        /// requireExplicitPolicy field.
        require_explicit_policy: Option<u32>,
        /// inhibitPolicyMapping field.
        inhibit_policy_mapping: Option<u32>,
    },
    /// inhibitAnyPolicy skip-certificate count.
    InhibitAnyPolicy(u32),
    /// nameConstraints.
    NameConstraints {
        /// Permitted subtrees.
        permitted_subtrees: Vec<GeneralSubtree>,
        /// Excluded subtrees.
        excluded_subtrees: Vec<GeneralSubtree>,
    },
    /// subjectAltName.
    SubjectAltName(Vec<GeneralName>),
    /// cRLDistributionPoints, presence only.
    CrlDistributionPoints,
    /// freshestCRL, presence only.
    FreshestCrl,
    /// authorityInfoAccess, presence only.
    AuthorityInfoAccess,
}

/// `Extension` is one certificate extension. A `None` value models an extension for which
/// no parsed semantic value is available; such extensions cause rejection when critical.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Extension {
    /// Extension OID.
    #[serde(with = "oid_serde")]
    pub oid: ObjectIdentifier,
    /// Criticality flag.
    pub critical: bool,
    /// Parsed value, or `None` if the extension could not be interpreted.
    pub value: Option<ExtensionValue>,
}

impl Extension {
    /// `from_value` creates an extension whose OID is implied by the typed value.
    pub fn from_value(critical: bool, value: ExtensionValue) -> Self {
        let oid = match &value {
            ExtensionValue::BasicConstraints { .. } => ID_CE_BASIC_CONSTRAINTS,
            ExtensionValue::KeyUsage(_) => ID_CE_KEY_USAGE,
            ExtensionValue::AuthorityKeyIdentifier { .. } => ID_CE_AUTHORITY_KEY_IDENTIFIER,
            ExtensionValue::SubjectKeyIdentifier(_) => ID_CE_SUBJECT_KEY_IDENTIFIER,
            ExtensionValue::CertificatePolicies(_) => ID_CE_CERTIFICATE_POLICIES,
            ExtensionValue::PolicyMappings(_) => ID_CE_POLICY_MAPPINGS,
            ExtensionValue::PolicyConstraints { .. } => ID_CE_POLICY_CONSTRAINTS,
            ExtensionValue::InhibitAnyPolicy(_) => ID_CE_INHIBIT_ANY_POLICY,
            ExtensionValue::NameConstraints { .. } => ID_CE_NAME_CONSTRAINTS,
            ExtensionValue::SubjectAltName(_) => ID_CE_SUBJECT_ALT_NAME,
            ExtensionValue::CrlDistributionPoints => ID_CE_CRL_DISTRIBUTION_POINTS,
            ExtensionValue::FreshestCrl => ID_CE_FRESHEST_CRL,
            ExtensionValue::AuthorityInfoAccess => ID_PE_AUTHORITY_INFO_ACCESS,
        };
        Extension {
            oid,
            critical,
            value: Some(value),
        }
    }

    /// `unparsed` creates an extension for which no semantic value is available.
    pub fn unparsed(oid: ObjectIdentifier, critical: bool) -> Self {
        Extension {
            oid,
            critical,
            value: None,
        }
    }
}

/// `Certificate` is a parsed X.509 certificate with the fields consumed during path
/// building and validation.
#[derive(Clone, Debug, Serialize)]
pub struct Certificate {
    /// Subject name.
    pub subject: Name,
    /// Issuer name.
    pub issuer: Name,
    /// Serial number.
    pub serial_number: SerialNumber,
    /// notBefore instant as seconds since the Unix epoch.
    pub not_before: u64,
    /// notAfter instant as seconds since the Unix epoch.
    pub not_after: u64,
    /// Subject public key info.
    pub subject_public_key_info: SubjectPublicKeyInfo,
    /// Signature algorithm.
    #[serde(with = "oid_serde")]
    pub signature_algorithm: ObjectIdentifier,
    /// Signature value, opaque to this crate and excluded from the tbs encoding.
    #[serde(skip)]
    pub signature: Vec<u8>,
    /// Extension list.
    pub extensions: Vec<Extension>,
    #[serde(skip)]
    tbs: OnceLock<Vec<u8>>,
}

impl Certificate {
    /// Instantiates a new `Certificate`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subject: Name,
        issuer: Name,
        serial_number: SerialNumber,
        not_before: u64,
        not_after: u64,
        subject_public_key_info: SubjectPublicKeyInfo,
        signature_algorithm: ObjectIdentifier,
        signature: Vec<u8>,
        extensions: Vec<Extension>,
    ) -> Self {
        Certificate {
            subject,
            issuer,
            serial_number,
            not_before,
            not_after,
            subject_public_key_info,
            signature_algorithm,
            signature,
            extensions,
            tbs: OnceLock::new(),
        }
    }

    /// `tbs` returns the canonical to-be-signed encoding of the certificate content,
    /// computing and caching it on first use. The computation is idempotent, so concurrent
    /// first uses converge on the same bytes.
    pub fn tbs(&self) -> &[u8] {
        self.tbs.get_or_init(|| {
            let mut buf = Vec::new();
            ciborium::ser::into_writer(self, &mut buf)
                .expect("certificate content serialization is infallible");
            buf
        })
    }

    /// `tbs_digest` returns the SHA-256 digest of the tbs encoding, used as the content
    /// key in the path builder's visited set.
    pub fn tbs_digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.tbs());
        hasher.finalize().into()
    }

    /// `get_extension` returns the first extension with the given OID, if present.
    pub fn get_extension(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.extensions.iter().find(|ext| &ext.oid == oid)
    }

    /// `subject_alt_names` returns all subjectAltName values across the certificate's
    /// extensions.
    pub fn subject_alt_names(&self) -> Vec<&GeneralName> {
        self.extensions
            .iter()
            .filter_map(|ext| match &ext.value {
                Some(ExtensionValue::SubjectAltName(names)) => Some(names.iter()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.tbs() == other.tbs()
    }
}

impl Eq for Certificate {}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(cn: &str) -> Name {
        Name::new(vec![AttributeTypeAndValue::new(
            const_oid::db::rfc4519::CN,
            cn,
        )])
    }

    fn minimal_cert(subject: &str, issuer: &str, serial: u64) -> Certificate {
        Certificate::new(
            name(subject),
            name(issuer),
            SerialNumber::from(serial),
            0,
            u64::MAX,
            SubjectPublicKeyInfo {
                algorithm: const_oid::db::rfc5912::RSA_ENCRYPTION,
                subject_public_key: vec![1, 2, 3],
            },
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            vec![],
            vec![],
        )
    }

    #[test]
    fn tbs_equality_ignores_signature() {
        let mut a = minimal_cert("A", "Root", 1);
        let b = minimal_cert("A", "Root", 1);
        a.signature = vec![0xde, 0xad];
        assert_eq!(a, b);
        assert_eq!(a.tbs_digest(), b.tbs_digest());
    }

    #[test]
    fn tbs_distinguishes_content() {
        let a = minimal_cert("A", "Root", 1);
        let b = minimal_cert("A", "Root", 2);
        assert_ne!(a, b);
        assert_ne!(a.tbs_digest(), b.tbs_digest());
    }

    #[test]
    fn extension_oids_follow_values() {
        let ext = Extension::from_value(false, ExtensionValue::BasicConstraints { ca: true });
        assert_eq!(ext.oid, ID_CE_BASIC_CONSTRAINTS);
        let ext = Extension::from_value(false, ExtensionValue::InhibitAnyPolicy(2));
        assert_eq!(ext.oid, ID_CE_INHIBIT_ANY_POLICY);
    }
}
