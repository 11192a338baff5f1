//! Shared fixtures for unit tests

use std::path::PathBuf;

use tempfile::TempDir;

pub fn create_test_workspace_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Write `content` to `relative` under `dir`, creating parent directories
pub fn create_test_file(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

pub const SLIDE_DECK: &str = "\
---
title: Demo
---

## Overview

![](logo.png){.absolute top=5% left=5% width=10%}

![](chart.png){.absolute .card bottom=10% right=10%}

![](badge.png){.absolute .card}

## Details

![](photo.png){.absolute .card top=40% left=40% width=20% height=20%}
";
