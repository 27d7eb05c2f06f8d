// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Workflow data model.
//!
//! `raw` mirrors the engine's wire representation verbatim; `lite` is the compact
//! projection the rest of the server speaks. `execution` covers the engine's
//! execution records, from which ghost-payload hints are derived.

mod execution;
mod lite;
mod raw;

pub use execution::{Execution, ExecutionList};
pub use lite::{
    BoundaryConnection, BoundaryDirection, DormantNode, FocusedWorkflow, LiteConnection, LiteNode,
    LiteWorkflow, ScanNode, ScanWorkflow, Segment, Zone, ZoneCounts, MAIN_CONNECTION,
};
pub use raw::{ConnectionMap, ConnectionTarget, CredentialRef, Node, Workflow, WorkflowList};
