use criterion::*;
use rand::seq::IteratorRandom;
use toprf_core::{
    PublicKeyShares, ShareIndex, ThresholdOprfSession, VerificationPolicy, create_shares,
    group::{self, ScalarField},
    oprf::{
        self, BlindingFactor,
        server::{OprfKey, OprfServer},
    },
    shamir,
};

fn oprf_bench(c: &mut Criterion) {
    c.bench_function("OPRF/HashToPoint", |b| {
        b.iter(|| oprf::client::encode_query(b"some client input"));
    });

    c.bench_function("OPRF/Client/Blind", |b| {
        let rng = &mut rand::thread_rng();
        let blinding_factor = BlindingFactor::rand(rng).expect("works");

        b.iter(|| oprf::client::blind_query(b"some client input", &blinding_factor));
    });

    c.bench_function("OPRF/Server/Response", |b| {
        let rng = &mut rand::thread_rng();
        let server = OprfServer::new(OprfKey::random(rng).expect("works"));

        b.iter_batched(
            || oprf::client::blind(b"some client input", rng).expect("works").0,
            |query| server.answer_query(&query),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("OPRF/Server/ResponseWithProof", |b| {
        let rng = &mut rand::thread_rng();
        let server = OprfServer::new(OprfKey::random(rng).expect("works"));

        b.iter_batched(
            || oprf::client::blind(b"some client input", rng).expect("works").0,
            |query| server.answer_query_with_proof(&query, &mut rand::thread_rng()),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("OPRF/Client/VerifyAndUnblind", |b| {
        let rng = &mut rand::thread_rng();
        let server = OprfServer::new(OprfKey::random(rng).expect("works"));
        let pk = server.public_key();

        b.iter_batched(
            || {
                let (query, blinding_factor) =
                    oprf::client::blind(b"some client input", rng).expect("works");
                let (response, proof) = server
                    .answer_query_with_proof(&query, rng)
                    .expect("works");
                (query, response, proof, blinding_factor)
            },
            |(query, response, proof, blinding_factor)| {
                oprf::client::verify_and_unblind(pk, &query, &response, &proof, &blinding_factor)
            },
            BatchSize::SmallInput,
        );
    });
}

fn threshold_bench(c: &mut Criterion) {
    for set_size in [3, 5, 7, 10, 20, 30] {
        c.bench_function(&format!("Shamir/Lagrange (t={set_size})"), |b| {
            let rng = &mut rand::thread_rng();
            b.iter_batched(
                || {
                    (1..=set_size as u16 * 2)
                        .choose_multiple(rng, set_size)
                        .into_iter()
                        .map(|i| ShareIndex::new(i).expect("works"))
                        .collect::<Vec<_>>()
                },
                |indices| shamir::lagrange_from_coeff(&indices),
                BatchSize::SmallInput,
            );
        });

        c.bench_function(&format!("Shamir/CombineThreshold (t={set_size})"), |b| {
            let rng = &mut rand::thread_rng();
            let evaluations = (0..set_size)
                .map(|i| group::hash_to_point(&[i as u8]))
                .collect::<Vec<_>>();
            b.iter_batched(
                || {
                    (1..=set_size as u16 * 2)
                        .choose_multiple(rng, set_size)
                        .into_iter()
                        .map(|i| ShareIndex::new(i).expect("works"))
                        .collect::<Vec<_>>()
                },
                |indices| shamir::combine_threshold(&indices, &evaluations, set_size),
                BatchSize::SmallInput,
            );
        });

        c.bench_function(&format!("Session/Finalize (t={set_size})"), |b| {
            let rng = &mut rand::thread_rng();
            let secret = group::random_scalar(rng).expect("works");
            let shares = create_shares(set_size * 2, set_size, secret, rng).expect("works");
            let public_shares = shares.iter().collect::<PublicKeyShares>();

            b.iter_batched(
                || {
                    let (request, blinding_factor) =
                        oprf::client::blind(b"some client input", rng).expect("works");
                    let mut session = ThresholdOprfSession::new(
                        public_shares.clone(),
                        set_size,
                        VerificationPolicy::Abort,
                        request,
                        blinding_factor,
                    )
                    .expect("works");
                    for share in shares.iter().choose_multiple(rng, set_size) {
                        let (response, proof) =
                            share.evaluate(session.request(), rng).expect("works");
                        session
                            .add_contribution(share.index(), &response, &proof)
                            .expect("works");
                    }
                    session
                },
                |session| session.finalize(),
                BatchSize::SmallInput,
            );
        });
    }

    c.bench_function("Keygen/CreateShares (n=10, t=5)", |b| {
        let rng = &mut rand::thread_rng();
        let secret = ScalarField::from(7u64);
        b.iter(|| create_shares(10, 5, secret, rng));
    });
}

criterion_group!(benches, oprf_bench, threshold_bench);

criterion_main!(benches);
