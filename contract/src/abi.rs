//! ABI bindings and creation bytecode for the voting contract.
//!
//! The contract keeps one candidate list, per-candidate vote counts, the set of
//! voter ids that have voted, and a numeric owner id. Every function is gated on
//! the deploying account, so reads and writes must both be sent `from` it.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolConstructor};
use std::sync::OnceLock;

use votebox_types::UserId;

sol! {
    contract Voting {
        constructor(bytes candidates, uint256 ownerId);

        function getCandidate(uint256 index) external view returns (bytes memory);
        function getNumberOfCandidates() external view returns (uint256);
        function getCandidateVotes(uint256 index) external view returns (uint256);
        function vote(uint256 voterId, uint256 candidateIndex) external;
        function hasVoted(uint256 voterId) external view returns (bool);
        function getOwner() external view returns (uint256);
        function kill() external;
    }
}

const VOTING_BYTECODE_HEX: &str = concat!(
    "608060405234801561001057600080fd5b50604051610a32380380610a32833981018060405281019080805182019291",
    "90602001805190602001909291905050506000336000806101000a81548173ffffffffffffffffffffffffffffffffff",
    "ffffff021916908373ffffffffffffffffffffffffffffffffffffffff16021790555081600481905550600260006040",
    "519080825280601f01601f1916602001820160405280156100bf5781602001602082028038833980820191505090505b",
    "509080600181540180825580915050906001820390600052602060002001600090919290919091509080519060200190",
    "6100fa92919061036b565b5050600090505b82518110156103635760007f010000000000000000000000000000000000",
    "000000000000000000000000000002838281518110151561013c57fe5b9060200101517f010000000000000000000000",
    "000000000000000000000000000000000000000090047f01000000000000000000000000000000000000000000000000",
    "00000000000000027effffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff1916141561022757",
    "600260006040519080825280601f01601f1916602001820160405280156101e557816020016020820280388339808201",
    "91505090505b509080600181540180825580915050906001820390600052602060002001600090919290919091509080",
    "51906020019061022092919061036b565b5050610356565b600260016002805490500381548110151561023e57fe5b90",
    "600052602060002001838281518110151561025657fe5b9060200101517f010000000000000000000000000000000000",
    "000000000000000000000000000090047f01000000000000000000000000000000000000000000000000000000000000",
    "000290808054603f811680603e81146102d4576002830184556001831615156102c6578192505b600160028404019350",
    "6102ee565b83600052602060002060ff19841681556041855560209450505b5050509060018203815460011615610315",
    "5790600052602060002090602091828204019190065b90919290919091601f036101000a81548160ff021916907f0100",
    "00000000000000000000000000000000000000000000000000000000000084040217905550505b808060010191505061",
    "0101565b505050610410565b828054600181600116156101000203166002900490600052602060002090601f01602090",
    "0481019282601f106103ac57805160ff19168380011785556103da565b828001600101855582156103da579182015b82",
    "8111156103d95782518255916020019190600101906103be565b5b5090506103e791906103eb565b5090565b61040d91",
    "905b808211156104095760008160009055506001016103f1565b5090565b90565b6106138061041f6000396000f30060",
    "8060405260043610610083576000357c0100000000000000000000000000000000000000000000000000000000900463",
    "ffffffff16806335b8e8201461008857806341c0e1b51461012e5780637a84d13e14610145578063866163c014610170",
    "578063893d20e8146101b1578063b384abef146101dc578063ecca031f14610213575b600080fd5b3480156100945760",
    "0080fd5b506100b360048036038101908080359060200190929190505050610258565b60405180806020018281038252",
    "83818151815260200191508051906020019080838360005b838110156100f35780820151818401526020810190506100",
    "d8565b50505050905090810190601f1680156101205780820380516001836020036101000a031916815260200191505b",
    "509250505060405180910390f35b34801561013a57600080fd5b5061014361036e565b005b34801561015157600080fd",
    "5b5061015a610403565b6040518082815260200191505060405180910390f35b34801561017c57600080fd5b5061019b",
    "60048036038101908080359060200190929190505050610410565b6040518082815260200191505060405180910390f3",
    "5b3480156101bd57600080fd5b506101c6610488565b6040518082815260200191505060405180910390f35b34801561",
    "01e857600080fd5b50610211600480360381019080803590602001909291908035906020019092919050505061049256",
    "5b005b34801561021f57600080fd5b5061023e60048036038101908080359060200190929190505050610562565b6040",
    "51808215151515815260200191505060405180910390f35b60606000809054906101000a900473ffffffffffffffffff",
    "ffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff163373ffffffffffffffffffffffff",
    "ffffffffffffffff161415156102b557600080fd5b6002828154811015156102c457fe5b906000526020600020018054",
    "600181600116156101000203166002900480601f01602080910402602001604051908101604052809291908181526020",
    "01828054600181600116156101000203166002900480156103625780601f106103375761010080835404028352916020",
    "0191610362565b820191906000526020600020905b81548152906001019060200180831161034557829003601f168201",
    "915b50505050509050919050565b6000809054906101000a900473ffffffffffffffffffffffffffffffffffffffff16",
    "73ffffffffffffffffffffffffffffffffffffffff163373ffffffffffffffffffffffffffffffffffffffff16141515",
    "6103c957600080fd5b6000809054906101000a900473ffffffffffffffffffffffffffffffffffffffff1673ffffffff",
    "ffffffffffffffffffffffffffffffff16ff5b6000600280549050905090565b60008060009054906101000a900473ff",
    "ffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff163373ffffffff",
    "ffffffffffffffffffffffffffffffff1614151561046d57600080fd5b60016000838152602001908152602001600020",
    "549050919050565b6000600454905090565b6000809054906101000a900473ffffffffffffffffffffffffffffffffff",
    "ffffff1673ffffffffffffffffffffffffffffffffffffffff163373ffffffffffffffffffffffffffffffffffffffff",
    "161480156104f457506104f282610562565b155b8015610504575060028054905081105b151561050f57600080fd5b60",
    "016003600084815260200190815260200160002060006101000a81548160ff0219169083151502179055506001600082",
    "8152602001908152602001600020600081548092919060010191905055505050565b60008060009054906101000a9004",
    "73ffffffffffffffffffffffffffffffffffffffff1673ffffffffffffffffffffffffffffffffffffffff163373ffff",
    "ffffffffffffffffffffffffffffffffffff161415156105bf57600080fd5b6003600083815260200190815260200160",
    "002060009054906101000a900460ff1690509190505600a165627a7a72305820f8fc6dcd2fcf20cf832cb62f3242e113",
    "04f91e63804754faa2cce79e213694610029",
);

/// Creation bytecode; constructor arguments are appended to it.
pub fn voting_bytecode() -> &'static [u8] {
    static BYTECODE: OnceLock<Vec<u8>> = OnceLock::new();
    BYTECODE.get_or_init(|| {
        hex::decode(VOTING_BYTECODE_HEX).expect("embedded bytecode is valid hex")
    })
}

/// Transaction payload that deploys a new voting contract.
pub fn deployment_data(candidates: Bytes, owner: UserId) -> Bytes {
    let args = Voting::constructorCall {
        candidates,
        ownerId: U256::from(owner.get()),
    }
    .abi_encode();
    let code = voting_bytecode();
    let mut data = Vec::with_capacity(code.len() + args.len());
    data.extend_from_slice(code);
    data.extend_from_slice(&args);
    Bytes::from(data)
}
