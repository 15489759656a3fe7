//! Per-actor runtime state.
//!
//! A cell owns the actor instance, its mailbox, and its scheduling status.
//! The status word moves `IDLE -> SCHEDULED` exactly once per run-queue entry
//! (by CAS), so a cell is never queued twice and never stepped by two workers
//! at once. The instance itself is taken out of its slot for the duration of
//! a step and put back afterwards.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::dead_letters::DeadLetterReason;
use crate::mailbox::{Dequeued, EnqueueOutcome, Mailbox};
use crate::message::{Envelope, SystemSignal};
use crate::registry::{ActorRecord, ActorStatus};
use crate::supervision::{FailureOutcome, resolve_directive};
use crate::system::SystemShared;
use crate::{
	Actor, ActorContext, ActorError, ActorId, ActorRef, DeadLetterOffice, PoisonPill, Props, SupervisorDirective,
	Terminated, Termination, panic_message,
};

const IDLE: u8 = 0;
const SCHEDULED: u8 = 1;
const STOPPED: u8 = 2;

enum StepFlow {
	Continue,
	Terminate(Termination),
}

#[derive(Default)]
struct WatchState {
	watchers: Vec<ActorRef>,
	terminated: Option<Termination>,
}

pub(crate) struct ActorCell {
	id: ActorId,
	parent: Option<Weak<ActorCell>>,
	props: Props,
	mailbox: Mailbox<Envelope, SystemSignal>,
	status: AtomicU8,
	actor: Mutex<Option<Box<dyn Actor>>>,
	restarts: AtomicUsize,
	/// `None` once the cell has terminated; late children are stopped on arrival.
	children: Mutex<Option<Vec<ActorRef>>>,
	watch_state: Mutex<WatchState>,
	termination: watch::Sender<Option<Termination>>,
	shared: Arc<SystemShared>,
}

impl ActorCell {
	pub(crate) fn new(id: ActorId, parent: Option<&Arc<ActorCell>>, props: Props, shared: Arc<SystemShared>) -> Arc<Self> {
		let config = props.mailbox.unwrap_or(shared.config.mailbox);
		let mailbox = match config.capacity {
			Some(capacity) => Mailbox::bounded(capacity.max(1), config.overflow),
			None => Mailbox::unbounded(),
		};
		let actor = props.produce();
		let (termination, _) = watch::channel(None);
		Arc::new(Self {
			id,
			parent: parent.map(Arc::downgrade),
			props,
			mailbox,
			status: AtomicU8::new(IDLE),
			actor: Mutex::new(Some(actor)),
			restarts: AtomicUsize::new(0),
			children: Mutex::new(Some(Vec::new())),
			watch_state: Mutex::new(WatchState::default()),
			termination,
			shared,
		})
	}

	pub(crate) fn id(&self) -> &ActorId {
		&self.id
	}

	pub(crate) fn parent(&self) -> Option<Arc<ActorCell>> {
		self.parent.as_ref().and_then(Weak::upgrade)
	}

	pub(crate) fn is_top_level(&self) -> bool {
		self.parent.is_none()
	}

	pub(crate) fn shared(&self) -> &Arc<SystemShared> {
		&self.shared
	}

	pub(crate) fn dead_letter_office(&self) -> Arc<DeadLetterOffice> {
		Arc::clone(&self.shared.dead_letters)
	}

	pub(crate) fn restarts(&self) -> usize {
		self.restarts.load(Ordering::Acquire)
	}

	pub(crate) fn is_terminated(&self) -> bool {
		self.termination.borrow().is_some()
	}

	pub(crate) fn termination(&self) -> Option<Termination> {
		self.termination.borrow().clone()
	}

	pub(crate) async fn terminated(&self) -> Termination {
		let mut rx = self.termination.subscribe();
		match rx.wait_for(Option::is_some).await {
			Ok(value) => value.clone().unwrap_or(Termination::Stopped),
			Err(_) => Termination::Stopped,
		}
	}

	pub(crate) fn record(&self) -> ActorRecord {
		let status = match self.status.load(Ordering::Acquire) {
			IDLE => ActorStatus::Idle,
			SCHEDULED => ActorStatus::Scheduled,
			_ => ActorStatus::Stopped,
		};
		ActorRecord {
			path: self.id.path().clone(),
			uid: self.id.uid(),
			parent: self.parent().map(|parent| parent.id().path().clone()),
			pending: self.mailbox.len(),
			restarts: self.restarts(),
			status,
		}
	}

	/// Queues `Start` so `pre_start` runs before any user message.
	pub(crate) fn start(self: &Arc<Self>) {
		self.send_system(SystemSignal::Start);
	}

	pub(crate) fn send_user(self: &Arc<Self>, envelope: Envelope) {
		match self.mailbox.enqueue_user(envelope) {
			EnqueueOutcome::Enqueued => self.schedule(),
			EnqueueOutcome::EvictedOldest(evicted) => {
				self.dead_letter(evicted, DeadLetterReason::MailboxOverflow);
				self.schedule();
			}
			EnqueueOutcome::DroppedNewest(rejected) => self.dead_letter(rejected, DeadLetterReason::MailboxOverflow),
			EnqueueOutcome::Closed(rejected) => {
				if let Some(sender) = &rejected.sender {
					sender.notify_target_terminated();
				}
				self.dead_letter(rejected, DeadLetterReason::RecipientTerminated);
			}
		}
	}

	pub(crate) fn send_system(self: &Arc<Self>, signal: SystemSignal) {
		if self.mailbox.enqueue_system(signal).is_ok() {
			self.schedule();
		}
	}

	fn dead_letter(&self, envelope: Envelope, reason: DeadLetterReason) {
		self.shared.dead_letters.record_envelope(self.id.path(), envelope, reason);
	}

	fn schedule(self: &Arc<Self>) {
		if self
			.status
			.compare_exchange(IDLE, SCHEDULED, Ordering::SeqCst, Ordering::SeqCst)
			.is_ok()
		{
			self.shared.dispatcher.enqueue(Arc::clone(self));
		}
	}

	/// Hands the cell back after a step: re-queues it if work arrived,
	/// otherwise marks it idle.
	pub(crate) fn release(self: &Arc<Self>) {
		if self.status.load(Ordering::SeqCst) != SCHEDULED {
			return;
		}
		if self.mailbox.has_messages() {
			self.shared.dispatcher.enqueue(Arc::clone(self));
			return;
		}
		self.status.store(IDLE, Ordering::SeqCst);
		// A sender may have enqueued between the check and the store.
		if self.mailbox.has_messages() {
			self.schedule();
		}
	}

	pub(crate) fn add_child(&self, child: ActorRef) -> bool {
		match self.children.lock().as_mut() {
			Some(children) => {
				children.push(child);
				true
			}
			None => false,
		}
	}

	pub(crate) fn children(&self) -> Vec<ActorRef> {
		self.children.lock().clone().unwrap_or_default()
	}

	fn remove_child(&self, id: &ActorId) {
		if let Some(children) = self.children.lock().as_mut() {
			children.retain(|child| child.id() != id);
		}
	}

	pub(crate) fn add_watcher(self: &Arc<Self>, watcher: ActorRef) {
		let already = {
			let mut state = self.watch_state.lock();
			if state.terminated.is_none() && !state.watchers.contains(&watcher) {
				state.watchers.push(watcher.clone());
			}
			state.terminated.clone()
		};
		if let Some(termination) = already {
			let actor = ActorRef::local(Arc::clone(self));
			watcher.tell(Terminated { actor, termination }, None);
		}
	}

	pub(crate) fn remove_watcher(&self, watcher: &ActorRef) {
		self.watch_state.lock().watchers.retain(|w| w != watcher);
	}

	/// Processes up to `throughput` mailbox items.
	pub(crate) async fn run_step(self: &Arc<Self>, throughput: usize) {
		if self.status.load(Ordering::SeqCst) == STOPPED {
			return;
		}
		let Some(mut actor) = self.actor.lock().take() else {
			tracing::error!(actor = %self.id, "actor.step.missing_instance");
			return;
		};
		for _ in 0..throughput.max(1) {
			let Some(item) = self.mailbox.dequeue() else {
				break;
			};
			let flow = match item {
				Dequeued::System(signal) => self.on_system(&mut actor, signal).await,
				Dequeued::User(envelope) => self.on_user(&mut actor, envelope).await,
			};
			if let StepFlow::Terminate(termination) = flow {
				self.terminate(actor, termination).await;
				return;
			}
		}
		*self.actor.lock() = Some(actor);
	}

	async fn on_system(self: &Arc<Self>, actor: &mut Box<dyn Actor>, signal: SystemSignal) -> StepFlow {
		match signal {
			SystemSignal::Start => self.start_instance(actor).await,
			SystemSignal::Stop => StepFlow::Terminate(Termination::Stopped),
			SystemSignal::Kill => StepFlow::Terminate(Termination::Killed),
			SystemSignal::Escalated { child, cause } => {
				let error = ActorError::Escalated {
					child,
					cause: Box::new(cause),
				};
				let mut ctx = ActorContext::new(Arc::clone(self), None);
				self.handle_failure(actor, error, &mut ctx).await
			}
		}
	}

	async fn on_user(self: &Arc<Self>, actor: &mut Box<dyn Actor>, envelope: Envelope) -> StepFlow {
		let Envelope { message, sender } = envelope;
		if message.is::<PoisonPill>() {
			return StepFlow::Terminate(Termination::Stopped);
		}
		let mut ctx = ActorContext::new(Arc::clone(self), sender.clone());
		let error = match AssertUnwindSafe(actor.handle(message, &mut ctx)).catch_unwind().await {
			Ok(Ok(())) if ctx.stop_requested() => return StepFlow::Terminate(Termination::Stopped),
			Ok(Ok(())) => return StepFlow::Continue,
			Ok(Err(error)) => error,
			Err(payload) => ActorError::Panicked(panic_message(payload.as_ref())),
		};
		if let Some(sender) = &sender {
			sender.fail_pending_ask(&error);
		}
		self.handle_failure(actor, error, &mut ctx).await
	}

	async fn handle_failure(
		self: &Arc<Self>,
		actor: &mut Box<dyn Actor>,
		error: ActorError,
		ctx: &mut ActorContext,
	) -> StepFlow {
		match self.decide(actor, &error, ctx).await {
			FailureOutcome::Resume => StepFlow::Continue,
			FailureOutcome::Restart => {
				self.replace_instance(actor, &error).await;
				self.start_instance(actor).await
			}
			FailureOutcome::Terminate { escalate } => self.fail(error, escalate),
		}
	}

	/// Runs `pre_start`, restarting in place while the directive says so.
	async fn start_instance(self: &Arc<Self>, actor: &mut Box<dyn Actor>) -> StepFlow {
		loop {
			let mut ctx = ActorContext::new(Arc::clone(self), None);
			let error = match AssertUnwindSafe(actor.pre_start(&mut ctx)).catch_unwind().await {
				Ok(Ok(())) if ctx.stop_requested() => return StepFlow::Terminate(Termination::Stopped),
				Ok(Ok(())) => return StepFlow::Continue,
				Ok(Err(error)) => error,
				Err(payload) => ActorError::Panicked(panic_message(payload.as_ref())),
			};
			match self.decide(actor, &error, &mut ctx).await {
				FailureOutcome::Resume => return StepFlow::Continue,
				FailureOutcome::Restart => self.replace_instance(actor, &error).await,
				FailureOutcome::Terminate { escalate } => return self.fail(error, escalate),
			}
		}
	}

	async fn decide(&self, actor: &mut Box<dyn Actor>, error: &ActorError, ctx: &mut ActorContext) -> FailureOutcome {
		let directive = AssertUnwindSafe(actor.on_failure(error, ctx))
			.catch_unwind()
			.await
			.unwrap_or(SupervisorDirective::Stop);
		let outcome = resolve_directive(directive, self.restarts(), self.props.max_restarts);
		tracing::warn!(actor = %self.id, %error, ?directive, ?outcome, "actor.failure");
		outcome
	}

	async fn replace_instance(self: &Arc<Self>, actor: &mut Box<dyn Actor>, cause: &ActorError) {
		let mut ctx = ActorContext::new(Arc::clone(self), None);
		if AssertUnwindSafe(actor.post_stop(&mut ctx)).catch_unwind().await.is_err() {
			tracing::warn!(actor = %self.id, "actor.post_stop.panicked");
		}
		*actor = self.props.produce();
		let restarts = self.restarts.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::info!(actor = %self.id, restarts, %cause, "actor.restart");
	}

	fn fail(&self, error: ActorError, escalate: bool) -> StepFlow {
		if escalate && let Some(parent) = self.parent() {
			parent.send_system(SystemSignal::Escalated {
				child: self.id.path().clone(),
				cause: error.clone(),
			});
		}
		StepFlow::Terminate(Termination::Failed(error))
	}

	async fn terminate(self: &Arc<Self>, mut actor: Box<dyn Actor>, termination: Termination) {
		self.close_mailbox(termination.is_abnormal());
		self.status.store(STOPPED, Ordering::SeqCst);

		let children = self.children.lock().take().unwrap_or_default();
		for child in &children {
			child.stop();
		}

		let mut ctx = ActorContext::new(Arc::clone(self), None);
		if AssertUnwindSafe(actor.post_stop(&mut ctx)).catch_unwind().await.is_err() {
			tracing::warn!(actor = %self.id, "actor.post_stop.panicked");
		}
		drop(actor);

		self.finish(termination, children.len());
	}

	/// Terminates a cell whose worker is gone, without running any hook.
	///
	/// Used once the dispatcher has been torn down: the cell ends up
	/// `Killed`, and later tells become dead letters.
	pub(crate) fn force_terminate(self: &Arc<Self>) {
		if self.is_terminated() {
			return;
		}
		self.close_mailbox(true);
		self.status.store(STOPPED, Ordering::SeqCst);
		let instance = self.actor.lock().take();
		drop(instance);
		let children = self.children.lock().take().unwrap_or_default();
		tracing::warn!(actor = %self.id, "actor.force_terminated");
		self.finish(Termination::Killed, children.len());
	}

	fn close_mailbox(&self, abnormal: bool) {
		for envelope in self.mailbox.close() {
			if abnormal && let Some(sender) = &envelope.sender {
				sender.notify_target_terminated();
			}
			self.dead_letter(envelope, DeadLetterReason::RecipientTerminated);
		}
	}

	fn finish(self: &Arc<Self>, termination: Termination, children: usize) {
		self.shared.registry.unregister(&self.id);
		if let Some(parent) = self.parent() {
			parent.remove_child(&self.id);
		}

		let watchers = {
			let mut state = self.watch_state.lock();
			state.terminated = Some(termination.clone());
			std::mem::take(&mut state.watchers)
		};
		let this = ActorRef::local(Arc::clone(self));
		for watcher in watchers {
			watcher.tell(
				Terminated {
					actor: this.clone(),
					termination: termination.clone(),
				},
				Some(&this),
			);
		}

		self.termination.send_replace(Some(termination.clone()));
		tracing::debug!(
			actor = %self.id,
			termination = termination.as_str(),
			children,
			"actor.terminated"
		);
	}
}
