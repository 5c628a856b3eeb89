//! Bundler runtime cache.
//!
//! The external bundler shim and its npm dependency tree live in a
//! per-install cache directory under the user's home, keyed by a hash of
//! the running executable's path so parallel installs never share state.
//! Building the cache writes the embedded runtime files and runs
//! `npm install` once; every compile after that reuses the tree.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::npm::{self, NpmError};

/// Error building or clearing the runtime cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Home directory cannot be determined
    #[error("Could not determine the home directory")]
    NoHome,
    /// File I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// npm invocation failed
    #[error(transparent)]
    Npm(#[from] NpmError),
}

/// Directory holding the bundler runtime for this install.
pub fn cache_dir() -> Result<PathBuf, CacheError> {
    let home = dirs::home_dir().ok_or(CacheError::NoHome)?;
    let exe = std::env::current_exe()?;
    Ok(cache_dir_for(&home, &exe))
}

fn cache_dir_for(home: &Path, exe: &Path) -> PathBuf {
    home.join(".pagepack").join(path_hash(exe)).join("runtime")
}

/// Filesystem-safe hash of a path.
fn path_hash(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Check whether the runtime cache exists.
pub fn is_cached() -> Result<bool, CacheError> {
    Ok(cache_dir()?.exists())
}

/// Write the runtime files and install their npm dependencies.
///
/// Returns the cache directory. Any previous cache content for this
/// install is replaced.
pub fn build_cache() -> Result<PathBuf, CacheError> {
    let dir = cache_dir()?;
    write_runtime_files(&dir)?;
    npm::install(&dir)?;
    Ok(dir)
}

/// Remove the runtime cache, returning the removed directory if any.
pub fn clear_cache() -> Result<Option<PathBuf>, CacheError> {
    let dir = cache_dir()?;
    if !dir.exists() {
        return Ok(None);
    }
    fs::remove_dir_all(&dir)?;
    Ok(Some(dir))
}

/// Fallback public directory shipped with the runtime.
pub fn public_dir() -> Result<PathBuf, CacheError> {
    Ok(cache_dir()?.join("public"))
}

/// Program and arguments invoking the cached bundler shim.
pub fn runtime_bundler_argv() -> Result<(String, Vec<String>), CacheError> {
    Ok(bundler_argv_for(&cache_dir()?))
}

fn bundler_argv_for(dir: &Path) -> (String, Vec<String>) {
    let shim = dir.join("scripts").join("bundle.js");
    ("node".to_string(), vec![shim.display().to_string()])
}

/// Write the embedded runtime files into a directory.
///
/// Replaces any existing content so a rebuilt cache never carries stale
/// files.
pub fn write_runtime_files(dir: &Path) -> Result<(), CacheError> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir.join("scripts"))?;
    fs::create_dir_all(dir.join("public"))?;

    fs::write(dir.join("package.json"), RUNTIME_PACKAGE_JSON)?;
    fs::write(dir.join("scripts").join("bundle.js"), RUNTIME_BUNDLE_JS)?;
    fs::write(dir.join("public").join("index.html"), RUNTIME_INDEX_HTML)?;
    fs::write(dir.join(".env"), RUNTIME_ENV)?;
    fs::write(dir.join(".gitignore"), RUNTIME_GITIGNORE)?;
    Ok(())
}

// ============================================================================
// Embedded runtime files
// ============================================================================

const RUNTIME_PACKAGE_JSON: &str = r#"{
  "name": "pagepack-runtime",
  "version": "1.0.0",
  "private": true,
  "license": "MIT",
  "dependencies": {
    "@babel/core": "^7.24.0",
    "@babel/preset-env": "^7.24.0",
    "@babel/preset-react": "^7.23.3",
    "babel-loader": "^9.1.3",
    "css-loader": "^6.10.0",
    "html-webpack-plugin": "^5.6.0",
    "react": "^18.2.0",
    "react-dom": "^18.2.0",
    "style-loader": "^3.3.4",
    "webpack": "^5.90.0"
  }
}
"#;

const RUNTIME_BUNDLE_JS: &str = r#"#!/usr/bin/env node
// One-shot bundle runner. Reads the JSON config passed as the single
// argument, runs webpack once, prints the stats report to stdout, and
// exits 0 (clean), 1 (compile errors), or 2 (internal fault).

'use strict';

const path = require('path');
const webpack = require('webpack');
const HtmlWebpackPlugin = require('html-webpack-plugin');

function buildConfig(job) {
  const production = job.mode === 'production';
  return {
    mode: job.mode,
    entry: path.resolve(job.entry),
    output: {
      path: path.resolve(job.out_dir),
      filename: production
        ? 'static/js/[name].[contenthash:8].js'
        : 'static/js/bundle.js',
      publicPath: job.public_url.endsWith('/')
        ? job.public_url
        : job.public_url + '/',
    },
    devtool: job.source_maps ? 'source-map' : false,
    optimization: { minimize: job.minify },
    resolve: {
      modules: ['node_modules', path.resolve(job.node_modules)].concat(
        job.style_paths.map((p) => path.resolve(p))
      ),
      extensions: ['.js', '.jsx', '.json'],
    },
    module: {
      rules: [
        {
          test: /\.(js|jsx)$/,
          include: path.resolve(job.src_dir),
          loader: require.resolve('babel-loader'),
          options: {
            presets: [
              require.resolve('@babel/preset-env'),
              require.resolve('@babel/preset-react'),
            ],
          },
        },
        {
          test: /\.css$/,
          use: [require.resolve('style-loader'), require.resolve('css-loader')],
        },
      ],
    },
    plugins: [
      new HtmlWebpackPlugin({
        template: path.resolve(job.html_template),
        title: job.page_name,
      }),
    ],
  };
}

function statsOptions(detail) {
  if (detail === 'full') {
    return { colors: false, chunks: false, modules: false };
  }
  return {
    colors: false,
    all: false,
    errors: true,
    errorDetails: true,
    warnings: true,
  };
}

function main() {
  let job;
  try {
    job = JSON.parse(process.argv[2]);
  } catch (err) {
    console.error('bad bundle config: ' + err.message);
    process.exit(2);
  }

  webpack(buildConfig(job), (err, stats) => {
    if (err) {
      console.error(err.stack || String(err));
      process.exit(2);
    }
    process.stdout.write(stats.toString(statsOptions(job.stats)) + '\n');
    process.exit(stats.hasErrors() ? 1 : 0);
  });
}

main();
"#;

const RUNTIME_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title><%= htmlWebpackPlugin.options.title %></title>
  </head>
  <body>
    <noscript>You need to enable JavaScript to run this page.</noscript>
    <div id="root"></div>
  </body>
</html>
"#;

const RUNTIME_ENV: &str = "NODE_PATH=.\n";

const RUNTIME_GITIGNORE: &str = "node_modules/\nbuild/\n*.log\n";
