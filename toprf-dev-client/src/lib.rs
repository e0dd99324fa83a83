#![deny(clippy::unwrap_used)]
//! A development client running the threshold OPRF against simulated local nodes.
//!
//! [`setup`] creates a master key, splits it into shares and spawns one [`LocalNode`] per share. [`run_oprf`] then
//! performs a complete evaluation: it blinds the input, asks a random quorum of nodes concurrently, verifies every
//! answer against the published public key shares, recombines, unblinds and cross-checks the result against a direct
//! evaluation with the master key.
//!
//! Nodes and client only exchange CBOR encoded [`toprf_types::api::v1`] messages.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use ark_ec::CurveGroup as _;
use eyre::Context as _;
use rand::{
    CryptoRng, Rng, SeedableRng,
    seq::{IteratorRandom, SliceRandom},
};
use rand_chacha::ChaCha12Rng;
use tokio::task::JoinSet;
use toprf_core::{
    Share, ShareIndex, ThresholdOprfSession, Verification, VerificationPolicy, create_shares,
    group::{self, ScalarField},
    keygen::recombine_public_key,
    oprf::{
        self,
        server::{OprfKey, OprfServer},
    },
};
use toprf_types::{
    api::{
        PROTOCOL_VERSION,
        v1::{EvaluationRequest, EvaluationResponse},
    },
    cbor,
    crypto::{OprfPublicKey, PartyId, PublicKeyShare},
};
use tracing::instrument;

pub(crate) mod config;
pub use config::*;

/// How a simulated node misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFault {
    /// Returns a valid group element that does not match its proof.
    TamperedEvaluation,
    /// Returns an evaluation whose encoding has a flipped bit and no longer decodes.
    CorruptEncoding,
}

/// A simulated OPRF node holding one key share.
pub struct LocalNode {
    share: Share,
    fault: Option<NodeFault>,
}

impl LocalNode {
    /// Creates a node. A node with a `fault` misbehaves on every request.
    pub fn new(share: Share, fault: Option<NodeFault>) -> Self {
        Self { share, fault }
    }

    /// The party id of this node.
    pub fn party_id(&self) -> PartyId {
        self.share.index().into()
    }

    /// The way this node misbehaves, if at all.
    pub fn fault(&self) -> Option<NodeFault> {
        self.fault
    }

    /// Returns `true` iff this node misbehaves.
    pub fn is_faulty(&self) -> bool {
        self.fault.is_some()
    }

    /// Answers a CBOR encoded [`EvaluationRequest`] with a CBOR encoded [`EvaluationResponse`].
    pub fn handle(
        &self,
        request: &[u8],
        rng: &mut (impl CryptoRng + Rng),
    ) -> eyre::Result<Vec<u8>> {
        let request = cbor::from_slice::<EvaluationRequest>(request)?;
        tracing::trace!("{} evaluating {}", self.party_id(), request.request_id);
        let (response, proof) = self
            .share
            .evaluate(&request.blinded_request(), rng)
            .context("while evaluating")?;
        let evaluation = match self.fault {
            // stays in the subgroup, but no longer matches the proof
            Some(NodeFault::TamperedEvaluation) => {
                (response.response() * ScalarField::from(2u64)).into_affine()
            }
            _ => response.response(),
        };
        let mut encoded = cbor::to_vec(&EvaluationResponse {
            request_id: request.request_id,
            party_id: self.party_id(),
            evaluation,
            proof,
        })?;
        if self.fault == Some(NodeFault::CorruptEncoding) {
            let point = group::point_to_bytes(evaluation);
            let offset = encoded
                .windows(point.len())
                .position(|window| window == point)
                .ok_or_else(|| eyre::eyre!("evaluation not found in encoded response"))?;
            encoded[offset + point.len() - 1] ^= 1;
        }
        Ok(encoded)
    }
}

/// The simulated deployment: the nodes and everything a client learns at setup.
pub struct Setup {
    /// All nodes, ordered by party id.
    pub nodes: Vec<Arc<LocalNode>>,
    /// The published public key shares.
    pub public_key_shares: Vec<PublicKeyShare>,
    /// The OPRF public key.
    pub public_key: OprfPublicKey,
    /// The threshold of the sharing.
    pub threshold: usize,
    reference: OprfServer,
}

/// The result of one threshold OPRF evaluation.
#[derive(Debug, Clone)]
pub struct OprfRunOutput {
    /// The 32-byte PRF output.
    pub output: [u8; 32],
    /// The nodes whose evaluations were recombined.
    pub contributors: Vec<ShareIndex>,
    /// The nodes whose answers were dropped, in ascending order.
    pub rejected: Vec<ShareIndex>,
}

/// Creates a master key and shares it among `config.nodes` nodes. `config.faulty` random nodes return tampered
/// evaluations, `config.corrupt` other random nodes return undecodable ones.
///
/// Checks that random quorums of public key shares recombine to the public key.
#[instrument(level = "debug", skip_all, fields(nodes = config.nodes, threshold = config.threshold))]
pub fn setup(config: &DevClientConfig, rng: &mut (impl CryptoRng + Rng)) -> eyre::Result<Setup> {
    config.validate()?;
    let key = OprfKey::random(rng)?;
    let shares = create_shares(config.nodes, config.threshold, key.expose(), rng)?;
    let mut misbehaving = (1..=config.nodes).choose_multiple(rng, config.faulty + config.corrupt);
    misbehaving.shuffle(rng);
    let (faulty, corrupt) = misbehaving.split_at(config.faulty);
    tracing::debug!("faulty nodes: {faulty:?}, corrupt nodes: {corrupt:?}");

    let public_key_shares = shares.iter().map(PublicKeyShare::from).collect::<Vec<_>>();
    let registry = toprf_types::crypto::public_key_shares(public_key_shares.iter().copied())?;
    let quorum = registry.indices().choose_multiple(rng, config.threshold);
    let recombined = recombine_public_key(&registry, &quorum, config.threshold)?;
    eyre::ensure!(
        recombined == key.public_key(),
        "public key shares do not recombine to the public key"
    );

    let nodes = shares
        .into_iter()
        .enumerate()
        .map(|(i, share)| {
            let fault = if faulty.contains(&(i + 1)) {
                Some(NodeFault::TamperedEvaluation)
            } else if corrupt.contains(&(i + 1)) {
                Some(NodeFault::CorruptEncoding)
            } else {
                None
            };
            Arc::new(LocalNode::new(share, fault))
        })
        .collect();
    Ok(Setup {
        nodes,
        public_key_shares,
        public_key: key.public_key().into(),
        threshold: config.threshold,
        reference: OprfServer::new(key),
    })
}

/// Executes one threshold OPRF evaluation of `input` against `candidates` random nodes.
///
/// # Errors
/// Under [`VerificationPolicy::Abort`] fails on the first node that cannot be reached, sends an undecodable or
/// mismatching answer, or fails its proof. Under [`VerificationPolicy::Discard`] such nodes are reported in
/// [`OprfRunOutput::rejected`] instead. Fails in both cases if fewer than `threshold` contributions are accepted or if
/// the result differs from the direct evaluation.
#[instrument(level = "debug", skip_all, fields(request_id = tracing::field::Empty))]
pub async fn run_oprf(
    setup: &Setup,
    input: &[u8],
    candidates: usize,
    policy: VerificationPolicy,
    rng: &mut ChaCha12Rng,
) -> eyre::Result<OprfRunOutput> {
    let (blinded_request, blinding_factor) = oprf::client::blind(input, rng)?;
    let request = EvaluationRequest::new(&blinded_request);
    tracing::Span::current().record("request_id", request.request_id.to_string());

    let registry =
        toprf_types::crypto::public_key_shares(setup.public_key_shares.iter().copied())?;
    let mut session = ThresholdOprfSession::new(
        registry,
        setup.threshold,
        policy,
        blinded_request,
        blinding_factor,
    )?;

    let mut quorum = setup.nodes.iter().choose_multiple(rng, candidates);
    quorum.sort_by_key(|node| node.party_id());
    tracing::debug!(
        "asking nodes {:?}",
        quorum.iter().map(|node| node.party_id().into_inner()).collect::<Vec<_>>()
    );

    let request_bytes = Arc::new(cbor::to_vec(&request)?);
    let mut evaluations = JoinSet::new();
    for node in quorum {
        let node = Arc::clone(node);
        let request_bytes = Arc::clone(&request_bytes);
        let mut node_rng = ChaCha12Rng::from_rng(&mut *rng)?;
        evaluations.spawn(async move {
            let party_id = node.party_id();
            let response = node
                .handle(&request_bytes, &mut node_rng)
                .with_context(|| format!("while asking {party_id}"));
            (party_id, response)
        });
    }

    // nodes whose answers never reached the session
    let mut failed = Vec::new();
    while let Some(result) = evaluations.join_next().await {
        let (party_id, response) = result.context("node task panicked")?;
        let index = party_id.share_index()?;
        let response = match response.and_then(|bytes| decode_response(&bytes, &request, party_id))
        {
            Ok(response) => response,
            Err(err) if policy == VerificationPolicy::Discard => {
                tracing::warn!("discarding answer of {party_id}: {err:#}");
                failed.push(index);
                continue;
            }
            Err(err) => return Err(err),
        };
        let verification = session
            .add_contribution(index, &response.blinded_response(), &response.proof)
            .with_context(|| format!("while verifying {party_id}"))?;
        if verification == Verification::Rejected {
            tracing::debug!("dropped contribution of {party_id}");
        }
    }

    let mut rejected = session.rejected().to_vec();
    rejected.extend(failed);
    rejected.sort();
    let output = session.finalize()?;
    let direct = setup.reference.key() * oprf::client::encode_query(input);
    eyre::ensure!(
        output.unblinded_response == direct,
        "threshold evaluation differs from direct evaluation"
    );
    Ok(OprfRunOutput {
        output: output.finalize(input),
        contributors: output.contributors,
        rejected,
    })
}

/// Decodes the answer of `party_id` and checks that it belongs to `request`.
fn decode_response(
    bytes: &[u8],
    request: &EvaluationRequest,
    party_id: PartyId,
) -> eyre::Result<EvaluationResponse> {
    let response = cbor::from_slice::<EvaluationResponse>(bytes)
        .with_context(|| format!("while decoding the answer of {party_id}"))?;
    eyre::ensure!(
        response.request_id == request.request_id,
        "{party_id} answered request {} instead of {}",
        response.request_id,
        request.request_id
    );
    eyre::ensure!(
        response.party_id == party_id,
        "{party_id} answered as {}",
        response.party_id
    );
    Ok(response)
}

fn avg(durations: &[Duration]) -> Duration {
    let n = durations.len();
    if n != 0 {
        let total = durations.iter().sum::<Duration>();
        total / n as u32
    } else {
        Duration::ZERO
    }
}

/// Runs `config.runs` evaluations of `config.input` and checks that all of them agree.
pub async fn run(config: DevClientConfig) -> eyre::Result<Vec<OprfRunOutput>> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha12Rng::seed_from_u64(seed),
        None => ChaCha12Rng::from_entropy(),
    };
    tracing::info!(
        "setting up {} nodes with threshold {} (protocol v{PROTOCOL_VERSION})",
        config.nodes,
        config.threshold
    );
    let setup = setup(&config, &mut rng)?;
    tracing::info!("OPRF public key: {}", setup.public_key);

    let mut outputs: Vec<OprfRunOutput> = Vec::with_capacity(config.runs);
    let mut durations = Vec::with_capacity(config.runs);
    let start = Instant::now();
    for run in 0..config.runs {
        let run_start = Instant::now();
        let output = run_oprf(
            &setup,
            config.input.as_bytes(),
            config.candidates(),
            config.policy.into(),
            &mut rng,
        )
        .await
        .with_context(|| format!("in run {run}"))?;
        durations.push(run_start.elapsed());
        if let Some(first) = outputs.first() {
            eyre::ensure!(
                first.output == output.output,
                "run {run} produced a different output"
            );
        }
        outputs.push(output);
    }
    let full_duration = start.elapsed();
    tracing::info!(
        "{} runs - total time: {full_duration:?} avg: {:?}",
        config.runs,
        avg(&durations)
    );
    Ok(outputs)
}
