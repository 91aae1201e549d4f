#[allow(clippy::too_many_arguments)]
pub mod exchange {
    alloy::sol!(
        /// EtherDelta/ForkDelta exchange contract.
        ///
        /// Orders are signed off-chain and filled on-chain with [`Exchange::tradeCall`].
        /// The `amount` of a trade is always denominated in the maker's `tokenGet`.
        #[derive(Debug)]
        #[sol(rpc)]
        contract Exchange {
            event Order(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce, address user);
            event Cancel(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce, address user, uint8 v, bytes32 r, bytes32 s);
            event Trade(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, address get, address give);
            event Deposit(address token, address user, uint256 amount, uint256 balance);
            event Withdraw(address token, address user, uint256 amount, uint256 balance);

            function feeMake() external view returns (uint256);
            function feeTake() external view returns (uint256);

            function deposit() external payable;
            function withdraw(uint256 amount) external;
            function depositToken(address token, uint256 amount) external;
            function withdrawToken(address token, uint256 amount) external;
            function balanceOf(address token, address user) external view returns (uint256);

            function order(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce) external;
            function trade(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce, address user, uint8 v, bytes32 r, bytes32 s, uint256 amount) external;
            function testTrade(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce, address user, uint8 v, bytes32 r, bytes32 s, uint256 amount, address sender) external view returns (bool);
            function availableVolume(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce, address user, uint8 v, bytes32 r, bytes32 s) external view returns (uint256);
            function amountFilled(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce, address user, uint8 v, bytes32 r, bytes32 s) external view returns (uint256);
            function cancelOrder(address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 expires, uint256 nonce, uint8 v, bytes32 r, bytes32 s) external;
        }
    );
}

pub mod erc20 {
    alloy::sol!(
        /// Standard ERC-20 token.
        #[derive(Debug)]
        #[sol(rpc)]
        contract Erc20 {
            function balanceOf(address owner) external view returns (uint256);
            function allowance(address owner, address spender) external view returns (uint256);
            function approve(address spender, uint256 amount) external returns (bool);
            function transfer(address to, uint256 amount) external returns (bool);
            function decimals() external view returns (uint8);
            function symbol() external view returns (string);
        }
    );
}
