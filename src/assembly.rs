//! Gallery assembly
//!
//! Turns a layout into textured blocks. Each placement is an independent
//! task: pick an image, load its texture, build the block. Tasks run either
//! one after another (blocks appear in layout order) or all at once (blocks
//! appear as their textures arrive).
//!
//! A failed texture load never stalls or aborts the gallery; the block gets
//! the loader's fallback texture instead.

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::rc::Rc;

use crate::error::GalleryResult;
use crate::gallery::{BlockPlacement, CurvedMesh, GalleryLayout};
use crate::scene::{Block, SceneGraph};

/// Image identifier inside the pool
pub type ImageId = u32;

/// Inclusive range of valid image ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePool {
    pub first: ImageId,
    pub last: ImageId,
}

impl ImagePool {
    pub fn contains(&self, id: ImageId) -> bool {
        (self.first..=self.last).contains(&id)
    }

    pub fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.last - self.first + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }
}

/// Expand a URL template (`assets/img{}.jpg`) for an image id
pub fn image_url(pattern: &str, id: ImageId) -> String {
    pattern.replacen("{}", &id.to_string(), 1)
}

/// Uniform image selection from the pool; repeats allowed
#[derive(Debug, Clone)]
pub struct ImagePicker<R> {
    pool: ImagePool,
    rng: R,
}

impl<R: Rng> ImagePicker<R> {
    pub fn new(pool: ImagePool, rng: R) -> Self {
        Self { pool, rng }
    }

    pub fn pick(&mut self) -> ImageId {
        self.rng.random_range(self.pool.first..=self.pool.last)
    }
}

/// Asynchronous texture source
pub trait TextureLoader {
    type Texture: Clone;

    /// Fetch and decode the texture for `id`
    fn load(&self, id: ImageId) -> impl Future<Output = GalleryResult<Self::Texture>>;

    /// Placeholder used when a load fails
    fn fallback(&self) -> Self::Texture;
}

/// How block tasks are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyPolicy {
    /// Load and insert one block at a time, in layout order
    Sequential,
    /// Start every load at once, insert in completion order
    #[default]
    Concurrent,
}

/// Whether a block got its own image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureSource {
    Loaded,
    Fallback,
}

/// Result of one block task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOutcome {
    pub section: u32,
    pub slot: u32,
    pub image: ImageId,
    pub source: TextureSource,
}

/// Block outcomes in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub outcomes: Vec<BlockOutcome>,
}

impl AssemblyReport {
    pub fn loaded(&self) -> usize {
        self.count(TextureSource::Loaded)
    }

    pub fn fallbacks(&self) -> usize {
        self.count(TextureSource::Fallback)
    }

    fn count(&self, source: TextureSource) -> usize {
        self.outcomes.iter().filter(|o| o.source == source).count()
    }
}

pub struct GalleryAssembler<'a, L, R> {
    loader: &'a L,
    picker: ImagePicker<R>,
    mesh: Rc<CurvedMesh>,
    policy: AssemblyPolicy,
}

impl<'a, L, R> GalleryAssembler<'a, L, R>
where
    L: TextureLoader,
    R: Rng,
{
    pub fn new(loader: &'a L, picker: ImagePicker<R>, mesh: Rc<CurvedMesh>, policy: AssemblyPolicy) -> Self {
        Self {
            loader,
            picker,
            mesh,
            policy,
        }
    }

    /// Build a block for every placement and insert it into `graph`
    ///
    /// Images are picked up front in layout order, so a seeded picker gives
    /// the same image per placement under either policy.
    pub async fn assemble<G>(&mut self, layout: &GalleryLayout, graph: &mut G) -> AssemblyReport
    where
        G: SceneGraph<L::Texture>,
    {
        let jobs: Vec<(BlockPlacement, ImageId)> = layout
            .placements
            .iter()
            .map(|p| (*p, self.picker.pick()))
            .collect();

        log::info!(
            "Assembling {} blocks ({:?})",
            jobs.len(),
            self.policy
        );

        let mut report = AssemblyReport {
            outcomes: Vec::with_capacity(jobs.len()),
        };

        match self.policy {
            AssemblyPolicy::Sequential => {
                for (placement, image) in jobs {
                    let (block, outcome) =
                        build_block(self.loader, Rc::clone(&self.mesh), placement, image).await;
                    graph.insert_block(block);
                    report.outcomes.push(outcome);
                }
            }
            AssemblyPolicy::Concurrent => {
                let mut pending: FuturesUnordered<_> = jobs
                    .into_iter()
                    .map(|(placement, image)| {
                        build_block(self.loader, Rc::clone(&self.mesh), placement, image)
                    })
                    .collect();
                while let Some((block, outcome)) = pending.next().await {
                    graph.insert_block(block);
                    report.outcomes.push(outcome);
                }
            }
        }

        log::info!(
            "Gallery assembled: {} loaded, {} placeholders",
            report.loaded(),
            report.fallbacks()
        );
        report
    }
}

/// One block task: load the texture (or fall back) and place the panel
async fn build_block<L: TextureLoader>(
    loader: &L,
    mesh: Rc<CurvedMesh>,
    placement: BlockPlacement,
    image: ImageId,
) -> (Block<L::Texture>, BlockOutcome) {
    let (texture, source) = match loader.load(image).await {
        Ok(texture) => (texture, TextureSource::Loaded),
        Err(e) => {
            log::warn!(
                "Block ({}, {}): {}; using placeholder",
                placement.section,
                placement.slot,
                e
            );
            (loader.fallback(), TextureSource::Fallback)
        }
    };

    let block = Block {
        section: placement.section,
        slot: placement.slot,
        image,
        texture,
        texture_source: source,
        mesh,
        offset_y: placement.vertical_offset(),
        rotation_y: placement.angular_offset(),
    };
    let outcome = BlockOutcome {
        section: placement.section,
        slot: placement.slot,
        image,
        source,
    };
    (block, outcome)
}
