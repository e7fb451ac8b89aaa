pub mod adapter;
pub mod autograd;
mod creation;
mod ops;
mod vec;

use autograd::{AccumulateGrad, Edge, Node};
use tensorlist_core::{
    buffer::Buffer,
    device::Device,
    dtype::DType,
    error::{Error, Result},
    layout::Layout,
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
    },
};

// ────────────────────────────────────────────────────────────────────────────
//  Tensor identity
// ────────────────────────────────────────────────────────────────────────────

/// Identity of one tensor implementation.
///
/// Clones of a [`Tensor`] share the id; [`Tensor::detach`] and [`Tensor::alias`] create a new id
/// over the same storage. Aliasing bookkeeping (dirty / non-differentiable marking) keys on this
/// id rather than on the handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(usize);
static TENSOR_COUNTER: AtomicUsize = AtomicUsize::new(1);
#[inline]
pub(crate) fn next_tensor_id() -> TensorId {
    TensorId(TENSOR_COUNTER.fetch_add(1, Ordering::Relaxed))
}

// ────────────────────────────────────────────────────────────────────────────
//  Storage
// ────────────────────────────────────────────────────────────────────────────

pub struct TensorStorage {
    buffer: RwLock<Box<dyn Buffer>>,
    version: AtomicU64,
}

impl TensorStorage {
    pub fn new(buffer: Box<dyn Buffer>) -> Self {
        Self {
            buffer: RwLock::new(buffer),
            version: AtomicU64::new(0),
        }
    }

    pub fn buffer(&self) -> Result<RwLockReadGuard<'_, Box<dyn Buffer>>> {
        self.buffer.read().map_err(|_| Error::Lock)
    }

    pub fn buffer_mut(&self) -> Result<RwLockWriteGuard<'_, Box<dyn Buffer>>> {
        self.buffer.write().map_err(|_| Error::Lock)
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

// ────────────────────────────────────────────────────────────────────────────
//  Metadata
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct TensorMetadata {
    device: Device,
    dtype: DType,
    layout: Layout,
}

impl TensorMetadata {
    pub fn new(device: Device, dtype: DType, layout: Layout) -> Self {
        Self { device, dtype, layout }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

#[derive(Default)]
struct AutogradMeta {
    requires_grad: bool,
    grad: Option<Tensor>,
    grad_fn: Option<Arc<dyn Node>>,
    output_nr: usize,
    grad_accumulator: Option<Weak<AccumulateGrad>>,
}

pub struct TensorImpl {
    id: TensorId,
    storage: Arc<TensorStorage>,
    metadata: TensorMetadata,
    autograd: RwLock<AutogradMeta>,
}

// ────────────────────────────────────────────────────────────────────────────
//  Tensor
// ────────────────────────────────────────────────────────────────────────────

/// Reference-counted tensor handle.
///
/// A handle is either defined (points at a [`TensorImpl`]) or undefined, the sentinel used for
/// "no value" / "no gradient" slots in value lists.
#[derive(Clone, Default)]
pub struct Tensor(Option<Arc<TensorImpl>>);

pub const NULL_TENSOR: Tensor = Tensor(None);

impl Tensor {
    pub(crate) fn from_storage(storage: Arc<TensorStorage>, metadata: TensorMetadata) -> Self {
        Self(Some(Arc::new(TensorImpl {
            id: next_tensor_id(),
            storage,
            metadata,
            autograd: RwLock::new(AutogradMeta::default()),
        })))
    }

    pub fn undefined() -> Self {
        NULL_TENSOR
    }

    pub fn is_defined(&self) -> bool {
        self.0.is_some()
    }

    #[inline]
    fn inner(&self) -> Result<&Arc<TensorImpl>> {
        self.0
            .as_ref()
            .ok_or_else(|| Error::InvalidState("tensor is undefined".into()))
    }

    /// Ownership token of the underlying implementation, `None` for undefined tensors.
    #[inline]
    pub fn id(&self) -> Option<TensorId> {
        self.0.as_ref().map(|t| t.id)
    }

    /// Returns `true` when both handles point at the same implementation.
    pub fn is_same(&self, other: &Tensor) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns `true` when both tensors view the same storage.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a.storage, &b.storage),
            _ => false,
        }
    }

    pub(crate) fn storage(&self) -> Result<&Arc<TensorStorage>> {
        Ok(&self.inner()?.storage)
    }

    pub fn metadata(&self) -> Result<&TensorMetadata> {
        Ok(&self.inner()?.metadata)
    }

    pub fn device(&self) -> Result<Device> {
        Ok(self.metadata()?.device)
    }

    pub fn dtype(&self) -> Result<DType> {
        Ok(self.metadata()?.dtype)
    }

    pub fn layout(&self) -> Result<&Layout> {
        Ok(&self.metadata()?.layout)
    }

    pub fn shape(&self) -> Result<Vec<usize>> {
        Ok(self.layout()?.shape().to_vec())
    }

    pub fn size(&self) -> Result<usize> {
        Ok(self.layout()?.size())
    }

    pub fn ndim(&self) -> Result<usize> {
        Ok(self.layout()?.ndim())
    }

    /// Number of in-place modifications applied to the underlying storage.
    pub fn version(&self) -> Result<u64> {
        Ok(self.storage()?.version())
    }

    /// Marks the storage as modified in place.
    pub fn bump_version(&self) -> Result<()> {
        self.storage()?.bump_version();
        Ok(())
    }
}

/// ## Autograd metadata
///
/// * `requires_grad` / `set_requires_grad` – leaf flag, implied for non-leaf tensors
/// * `grad_fn` / `output_nr` – the producing node and the output slot on it
/// * `grad` / `zero_grad` – accumulated leaf gradient
/// * `detach` / `alias` – new implementations over the same storage
impl Tensor {
    fn autograd(&self) -> Result<RwLockReadGuard<'_, AutogradMeta>> {
        self.inner()?.autograd.read().map_err(|_| Error::Lock)
    }

    fn autograd_mut(&self) -> Result<RwLockWriteGuard<'_, AutogradMeta>> {
        self.inner()?.autograd.write().map_err(|_| Error::Lock)
    }

    /// Whether gradients flow to this tensor. Undefined tensors never require grad.
    pub fn requires_grad(&self) -> bool {
        match self.autograd() {
            Ok(meta) => meta.requires_grad || meta.grad_fn.is_some(),
            Err(_) => false,
        }
    }

    pub fn set_requires_grad(&self, requires_grad: bool) -> Result<()> {
        if requires_grad && !self.dtype()?.is_float() {
            return Err(Error::UnsupportedDType);
        }

        let mut meta = self.autograd_mut()?;
        if meta.grad_fn.is_some() {
            return Err(Error::InvalidArgument(
                "requires_grad can only be changed on leaf tensors".into(),
            ));
        }
        meta.requires_grad = requires_grad;
        Ok(())
    }

    pub fn is_leaf(&self) -> bool {
        self.grad_fn().is_none()
    }

    pub fn grad_fn(&self) -> Option<Arc<dyn Node>> {
        self.autograd().ok().and_then(|meta| meta.grad_fn.clone())
    }

    pub fn output_nr(&self) -> usize {
        self.autograd().map(|meta| meta.output_nr).unwrap_or(0)
    }

    /// Makes `node` the producer of this tensor at output slot `output_nr`.
    pub fn set_gradient_edge(&self, node: Arc<dyn Node>, output_nr: usize) -> Result<()> {
        let mut meta = self.autograd_mut()?;
        meta.grad_fn = Some(node);
        meta.output_nr = output_nr;
        Ok(())
    }

    /// Like [`set_gradient_edge`](Self::set_gradient_edge), for a tensor that was modified in place.
    pub fn rebase_history(&self, node: Arc<dyn Node>, output_nr: usize) -> Result<()> {
        if self.is_leaf() && self.requires_grad() {
            return Err(Error::LeafModifiedInPlace);
        }
        self.set_gradient_edge(node, output_nr)
    }

    /// The edge a consumer of this tensor should point at, if gradients flow to it.
    pub fn gradient_edge(&self) -> Result<Option<Edge>> {
        if let Some(grad_fn) = self.grad_fn() {
            return Ok(Some(Edge::new(grad_fn, self.output_nr())));
        }
        if self.requires_grad() {
            let accumulator: Arc<dyn Node> = self.grad_accumulator()?;
            return Ok(Some(Edge::new(accumulator, 0)));
        }
        Ok(None)
    }

    /// Returns the leaf's gradient accumulator, creating it on first use.
    pub fn grad_accumulator(&self) -> Result<Arc<AccumulateGrad>> {
        let mut meta = self.autograd_mut()?;
        if let Some(existing) = meta.grad_accumulator.as_ref().and_then(Weak::upgrade) {
            return Ok(existing);
        }
        let accumulator = Arc::new(AccumulateGrad::new(self.clone()));
        meta.grad_accumulator = Some(Arc::downgrade(&accumulator));
        Ok(accumulator)
    }

    pub fn grad(&self) -> Option<Tensor> {
        self.autograd().ok().and_then(|meta| meta.grad.clone())
    }

    pub(crate) fn set_grad(&self, grad: Option<Tensor>) -> Result<()> {
        self.autograd_mut()?.grad = grad;
        Ok(())
    }

    /// Adds `grad` into `.grad()` under a single lock, so concurrent passes sharing this leaf
    /// do not lose updates.
    pub(crate) fn accumulate_grad(&self, grad: &Tensor) -> Result<()> {
        let mut meta = self.autograd_mut()?;
        let updated = match &meta.grad {
            Some(existing) => existing.add(grad)?,
            None => grad.detach()?,
        };
        meta.grad = Some(updated);
        Ok(())
    }

    pub fn zero_grad(&self) -> Result<()> {
        self.set_grad(None)
    }

    /// A new tensor over the same storage with no autograd history.
    pub fn detach(&self) -> Result<Tensor> {
        let inner = self.inner()?;
        Ok(Self::from_storage(inner.storage.clone(), inner.metadata.clone()))
    }

    /// Same as [`detach`](Self::detach); used where the result is about to receive its own
    /// gradient edge.
    pub fn alias(&self) -> Result<Tensor> {
        self.detach()
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => write!(f, "Tensor(undefined)"),
            Some(inner) => {
                let grad_fn = self.grad_fn().map(|n| n.name());
                f.debug_struct("Tensor")
                    .field("id", &inner.id)
                    .field("shape", &inner.metadata.layout.shape())
                    .field("dtype", &inner.metadata.dtype)
                    .field("requires_grad", &self.requires_grad())
                    .field("grad_fn", &grad_fn)
                    .finish()
            }
        }
    }
}

/// ## Execution helpers
///
/// * `backward`      – backward pass from a single-element tensor, seeded with ones
/// * `backward_with` – explicit seed gradient and buffer retention policy
impl Tensor {
    pub fn backward(&self) -> Result<()> {
        autograd::backward(std::slice::from_ref(self), &[Tensor::undefined()], false)
    }

    /// Runs the backward pass seeded with `grad` (undefined for an implicit ones seed).
    ///
    /// With `retain_graph` the saved buffers of every visited node are kept, so the same graph
    /// can be traversed again.
    pub fn backward_with(&self, grad: &Tensor, retain_graph: bool) -> Result<()> {
        autograd::backward(std::slice::from_ref(self), std::slice::from_ref(grad), retain_graph)
    }
}
