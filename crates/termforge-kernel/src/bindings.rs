//! Fixed identifiers of the clinical-terminology standard whose naming and
//! versioning conventions converted terminologies follow.
//!
//! These are well-known constants, never derived from a run namespace:
//! they must be identical across every conversion so that independently
//! converted terminologies attach to the same structural nodes.

use crate::ident::Identifier;
use uuid::uuid;

/// The "is-a" hierarchy relationship type.
pub const IS_A: Identifier = Identifier(uuid!("c93a30b9-ba77-3adb-a9b8-4589c9f8fb25"));

/// The fixed system user stamped as author on every record.
pub const AUTHOR: Identifier = Identifier(uuid!("f7495b58-6630-3499-a44e-2052b5fcf06c"));

/// The fixed "unspecified" module stamped on every record.
pub const UNSPECIFIED_MODULE: Identifier =
    Identifier(uuid!("40d1c869-b509-32f8-b735-836eac577a67"));

// Description types.
pub const FULLY_SPECIFIED_NAME: Identifier =
    Identifier(uuid!("00791270-77c9-32b6-b34f-d932569bd2bf"));
pub const SYNONYM: Identifier = Identifier(uuid!("8bfba944-3965-3946-9bcb-1e80a5da63a2"));
pub const DEFINITION: Identifier = Identifier(uuid!("700546a3-09c7-3fc2-9eb9-53d318659a09"));

// Regional-dialect acceptability.
pub const ACCEPTABILITY_PREFERRED: Identifier =
    Identifier(uuid!("266f1bc3-3361-39f3-bffe-69db9daea56e"));
pub const ACCEPTABILITY_ACCEPTABLE: Identifier =
    Identifier(uuid!("12b9e103-060e-3256-9982-18c1191af60e"));
pub const US_ENGLISH_DIALECT: Identifier =
    Identifier(uuid!("bca0a686-3516-3daf-8fcf-fe396d13cfad"));

// Relationship characteristic / refinability markers.
pub const STATED_RELATIONSHIP: Identifier =
    Identifier(uuid!("3b0dbd3b-2e53-3a30-8576-6c7fa7773060"));
pub const NOT_REFINABLE: Identifier = Identifier(uuid!("e4cde443-8fb6-11db-b606-0800200c9a66"));

/// Default member-type for legacy refset memberships ("normal member").
pub const NORMAL_MEMBER: Identifier = Identifier(uuid!("cc624429-b17d-4ac5-a69e-0b32448aaf3c"));

// Path machinery.
pub const PATH: Identifier = Identifier(uuid!("4459d8cf-5a6f-3952-9458-6d64324b27b7"));
pub const PATH_REFSET: Identifier = Identifier(uuid!("fd9d47b7-c0a4-3eee-b9bd-d4102c2dc2eb"));
pub const PATH_ORIGIN_REFSET: Identifier =
    Identifier(uuid!("1239b874-41b4-32a1-981f-88b448829b4b"));
pub const PATH_RELEASE: Identifier = Identifier(uuid!("88f89cc0-1d94-34a4-85ed-aa1949079314"));

/// Bootstrap path on which the path concept itself is created.
pub const AUXILIARY_PATH: Identifier = Identifier(uuid!("2faa9260-8fb2-11db-b606-0800200c9a66"));

/// Root organizing node for refset identity concepts.
pub const REFSET_IDENTITY: Identifier =
    Identifier(uuid!("3e0cd740-2cc6-3d68-ace7-bad2eb2621da"));

/// Shared "Project Refsets" root under [`REFSET_IDENTITY`].
pub const PROJECT_REFSETS: Identifier =
    Identifier(uuid!("7fe3e31f-a969-53ff-8702-f7837e4a03d9"));
pub const PROJECT_REFSETS_NAME: &str = "Project Refsets";

// Foundation metadata parents for source-type organizing concepts.
pub const REFERENCE_SET_FOUNDATION: Identifier =
    Identifier(uuid!("7e38cd2d-6f1a-3a81-be0b-21e6090573c2"));
pub const REFERENCE_SET_ATTRIBUTE: Identifier =
    Identifier(uuid!("7e52203e-8a35-3121-b2e7-b783b34d97f2"));

/// Default column identity for single-value dynamic assemblages.
pub const DYNAMIC_COLUMN_VALUE: Identifier =
    Identifier(uuid!("dbfd9bd2-b5ff-3762-9045-8dddf336b9b4"));

/// Assemblage under which a dynamic-assemblage concept records its own
/// column definition and usage description.
pub const DYNAMIC_DEFINITION: Identifier =
    Identifier(uuid!("b8f7a9d1-4e02-5c33-9d4a-6f1e2b8c0a57"));

/// Assemblage cataloging which dynamic assemblages need downstream indexes.
pub const DYNAMIC_INDEX_CONFIGURATION: Identifier =
    Identifier(uuid!("a5de9b3c-7f18-5a46-8e02-94c3d1b6f2e9"));
