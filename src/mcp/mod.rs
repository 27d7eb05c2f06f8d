// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! Tool arguments are validated against their schemars-derived schemas by the
//! transport before a handler runs; handlers speak lite form exclusively.

mod server;
mod types;

pub use server::ProteusMcp;
